//! Image Resolution Module
//!
//! 商品のオプション画像と商品画像から表示用URLの順序付きリストを決定し、
//! テンプレートの画像列へ展開するモジュール。

use serde::Serialize;

use crate::config::ImageConfig;
use crate::types::{CellValue, OutputRow, Template};

/// URLの取得元
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    /// オプション画像（単一URL）
    OptionImage,

    /// 商品画像（複数URL）
    ProductImages,

    /// 画像なし
    None,
}

/// 1行分の画像URLの順序付きリスト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUrlSet {
    urls: Vec<String>,
    source: ImageSource,
}

impl ImageUrlSet {
    /// オプション画像と商品画像からURLリストを決定する
    ///
    /// オプション画像が空でなければ、それだけがURLリストの唯一の要素になります。
    /// そうでなければ商品画像を空白・改行で分割し、順序を保ったまま使用します。
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use sheetbridge::images::ImageUrlSet;
    /// use sheetbridge::CellValue;
    ///
    /// let set = ImageUrlSet::resolve(
    ///     &CellValue::text(""),
    ///     &CellValue::text("http://b.jpg\nhttp://c.jpg"),
    /// );
    /// assert_eq!(set.urls(), ["http://b.jpg", "http://c.jpg"]);
    /// ```
    pub fn resolve(option_image: &CellValue, product_images: &CellValue) -> Self {
        let option = option_image.as_raw_string();
        let option = option.trim();
        if !option.is_empty() {
            return Self {
                urls: vec![option.to_string()],
                source: ImageSource::OptionImage,
            };
        }

        let urls: Vec<String> = product_images
            .as_raw_string()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let source = if urls.is_empty() {
            ImageSource::None
        } else {
            ImageSource::ProductImages
        };

        Self { urls, source }
    }

    /// URLのリスト
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// 先頭のURL
    pub fn first(&self) -> Option<&str> {
        self.urls.first().map(String::as_str)
    }

    /// URLの取得元
    pub fn source(&self) -> ImageSource {
        self.source
    }

    /// URLの数
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// URLが存在しないかどうか
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// テンプレート上の画像列の位置
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageColumns {
    /// 詳細画像列
    pub detail: Option<usize>,

    /// バリアント画像列（出現順）
    pub variants: Vec<usize>,
}

impl ImageColumns {
    /// テンプレートのヘッダーから画像列を特定する
    ///
    /// 詳細画像列は最初に出現する列だけを使用します。
    /// バリアント画像列は`max_variant_images`が指定されていればその数までに制限されます。
    pub fn locate(template: &Template, config: &ImageConfig) -> Self {
        let detail = template.columns_named(&config.detail_column).first().copied();
        let mut variants = template.columns_named(&config.variant_column);
        if let Some(max) = config.max_variant_images {
            variants.truncate(max);
        }
        Self { detail, variants }
    }

    /// URLリストを出力行に展開する
    ///
    /// 先頭のURLは詳細画像列と最初のバリアント画像列の両方に書き込まれ、
    /// 2番目以降のURLは後続のバリアント画像列に順に書き込まれます。
    ///
    /// # 戻り値
    ///
    /// バリアント画像列が足りずに書き込まれなかったURLの数
    pub fn fan_out(&self, set: &ImageUrlSet, row: &mut OutputRow) -> usize {
        if let (Some(column), Some(first)) = (self.detail, set.first()) {
            if let Some(cell) = row.get_mut(column) {
                *cell = CellValue::text(first);
            }
        }

        for (column, url) in self.variants.iter().zip(set.urls()) {
            if let Some(cell) = row.get_mut(*column) {
                *cell = CellValue::text(url.as_str());
            }
        }

        set.len().saturating_sub(self.variants.len())
    }
}
