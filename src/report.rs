//! Run Report Module
//!
//! 変換処理の集計結果（在庫フィルタ、パーティション、カテゴリ、画像、出力ファイル）を
//! まとめるモジュール。ログ出力とJSON出力の両方に使用されます。

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::error::CatalogError;
use crate::images::{ImageSource, ImageUrlSet};
use crate::rules::CategoryEngine;
use crate::stock::StockCounts;

/// 画像URLの集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImageStats {
    /// オプション画像を使用した行数
    pub option_image: usize,

    /// 商品画像を使用した行数
    pub product_images: usize,

    /// 画像のない行数
    pub none: usize,

    /// 画像列が足りずに破棄されたURLの数
    pub truncated_urls: usize,
}

impl ImageStats {
    /// 1行分の結果を記録する
    pub fn record(&mut self, set: &ImageUrlSet, dropped: usize) {
        match set.source() {
            ImageSource::OptionImage => self.option_image += 1,
            ImageSource::ProductImages => self.product_images += 1,
            ImageSource::None => self.none += 1,
        }
        self.truncated_urls += dropped;
    }

    /// 別の集計を加算する
    pub fn merge(&mut self, other: &ImageStats) {
        self.option_image += other.option_image;
        self.product_images += other.product_images;
        self.none += other.none;
        self.truncated_urls += other.truncated_urls;
    }
}

/// カテゴリごとの件数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub code: String,
    pub description: String,
    pub count: usize,
}

/// パーティションごとの結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PartitionReport {
    pub name: String,
    pub description: String,
    pub rows: usize,

    /// 書き込まれた出力ファイル
    pub files: Vec<PathBuf>,

    /// 書き込まれた更新用ファイル
    pub update_files: Vec<PathBuf>,
}

/// 変換処理全体の結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// 在庫フィルタが有効だったかどうか
    pub stock_filter_enabled: bool,

    /// 在庫フィルタの集計
    pub stock: StockCounts,

    /// パーティションごとの結果（宣言順）
    pub partitions: Vec<PartitionReport>,

    /// カテゴリごとの件数（コード順）
    pub categories: Vec<CategoryCount>,

    /// 画像URLの集計
    pub images: ImageStats,
}

impl RunReport {
    /// カテゴリの件数表を説明付きのリストに変換する
    pub fn category_counts(
        histogram: &BTreeMap<String, usize>,
        engine: &CategoryEngine,
    ) -> Vec<CategoryCount> {
        histogram
            .iter()
            .map(|(code, count)| CategoryCount {
                code: code.clone(),
                description: engine.describe(code).unwrap_or("Unknown").to_string(),
                count: *count,
            })
            .collect()
    }

    /// 書き込まれたすべてのファイル
    pub fn files_written(&self) -> Vec<&PathBuf> {
        self.partitions
            .iter()
            .flat_map(|p| p.files.iter().chain(p.update_files.iter()))
            .collect()
    }

    /// 出力行の合計
    pub fn total_rows(&self) -> usize {
        self.partitions.iter().map(|p| p.rows).sum()
    }

    /// 集計結果をログに出力する
    pub fn log(&self) {
        if self.stock_filter_enabled {
            info!(
                total = self.stock.total,
                kept = self.stock.kept,
                excluded = self.stock.excluded,
                "stock filter"
            );
        }
        for partition in &self.partitions {
            info!(
                partition = %partition.name,
                rows = partition.rows,
                files = partition.files.len() + partition.update_files.len(),
                "{}",
                partition.description
            );
        }
        for category in &self.categories {
            info!(code = %category.code, count = category.count, "{}", category.description);
        }
        info!(
            option_image = self.images.option_image,
            product_images = self.images.product_images,
            none = self.images.none,
            truncated_urls = self.images.truncated_urls,
            "image sources"
        );
    }

    /// JSON文字列に変換する（整形済み）
    pub fn to_json(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
