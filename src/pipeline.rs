//! Mapping Pipeline Module
//!
//! ソーステーブルの各行をテンプレートの列構成に変換するモジュール。
//!
//! 処理の流れ:
//!
//! 1. ソースのヘッダーを検証（参照されるすべての列が存在すること）
//! 2. 在庫フィルタ（有効な場合）
//! 3. SKUの接頭辞でパーティションに振り分け
//! 4. パーティションごとに各行を変換
//!    - 列の対応に従ってコピー（登録されている変換を適用）
//!    - 固定値で上書き
//!    - カテゴリコードの割り当て
//!    - 画像URLの展開
//! 5. カラー未設定行の補完
//!
//! 出力はメモリ上に構築され、ファイルへの書き込みは行いません。

use std::collections::{BTreeMap, HashMap};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::api::TransformKind;
use crate::config::{Config, PartitionSpec, VariationConfig};
use crate::error::CatalogError;
use crate::images::{ImageColumns, ImageUrlSet};
use crate::partition::Partitioner;
use crate::report::ImageStats;
use crate::rules::CategoryEngine;
use crate::stock::{self, StockCounts};
use crate::transform::{sku_base_code, TransformRegistry};
use crate::types::{CellValue, OutputRow, OutputTable, SourceRow, Table, Template};

/// パーティション1つ分の変換結果
#[derive(Debug, Clone)]
pub struct PartitionOutput {
    /// パーティション定義
    pub spec: PartitionSpec,

    /// 出力テーブル（ソースの相対順序を保持）
    pub table: OutputTable,

    /// カテゴリコードごとの件数
    pub categories: BTreeMap<String, usize>,

    /// 画像URLの集計
    pub images: ImageStats,
}

/// 変換処理全体の結果
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// 在庫フィルタの集計
    pub stock: StockCounts,

    /// パーティションごとの結果（宣言順、空のパーティションも含む）
    pub partitions: Vec<PartitionOutput>,
}

impl ProcessOutput {
    /// パーティション名で出力テーブルを取得する
    pub fn table(&self, name: &str) -> Option<&OutputTable> {
        self.partitions
            .iter()
            .find(|p| p.spec.name == name)
            .map(|p| &p.table)
    }

    /// すべてのパーティションのカテゴリ件数を合算する
    pub fn category_histogram(&self) -> BTreeMap<String, usize> {
        let mut total = BTreeMap::new();
        for partition in &self.partitions {
            for (code, count) in &partition.categories {
                *total.entry(code.clone()).or_insert(0) += count;
            }
        }
        total
    }

    /// すべてのパーティションの画像集計を合算する
    pub fn image_stats(&self) -> ImageStats {
        let mut total = ImageStats::default();
        for partition in &self.partitions {
            total.merge(&partition.images);
        }
        total
    }
}

/// 列の対応1件分の変換計画
#[derive(Debug, Clone)]
struct MappedColumn {
    source: usize,
    transform: Option<TransformKind>,
    targets: Vec<usize>,
}

#[derive(Debug, Clone)]
struct VariationPlan {
    color_source: usize,
    sku_source: usize,
    color_targets: Vec<usize>,
    theme_targets: Vec<usize>,
}

/// ソースとテンプレートの列位置を解決した変換計画
///
/// 列名の検索は計画の構築時に一度だけ行い、行ごとの処理では行いません。
#[derive(Debug, Clone)]
struct RowPlan {
    width: usize,
    mappings: Vec<MappedColumn>,
    fixed: Vec<(Vec<usize>, CellValue)>,
    category_targets: Vec<usize>,
    name_source: usize,
    image_context_source: Option<usize>,
    option_image_source: usize,
    product_images_source: usize,
    images: ImageColumns,
    variation: Option<VariationPlan>,
}

/// 列変換パイプライン
///
/// 設定から構築され、以後変更されません。
#[derive(Debug, Clone)]
pub struct MappingPipeline {
    config: Config,
    registry: TransformRegistry,
    engine: CategoryEngine,
    partitioner: Partitioner,
}

impl MappingPipeline {
    /// 設定からパイプラインを構築する
    ///
    /// # 戻り値
    ///
    /// * `Err(CatalogError::Config)` - 設定の検証に失敗した場合
    pub fn new(config: Config) -> Result<Self, CatalogError> {
        config.validate()?;
        let registry = config.transform_registry()?;
        let engine = config.category_engine()?;
        let partitioner = Partitioner::new(config.partitions.clone())?;

        for entry in &config.transforms {
            let mapped = config
                .mappings
                .iter()
                .any(|m| m.source == entry.source && m.destination == entry.destination);
            if !mapped {
                warn!(
                    source = %entry.source,
                    destination = %entry.destination,
                    "transform has no matching column mapping and will never run"
                );
            }
        }

        Ok(Self {
            config,
            registry,
            engine,
            partitioner,
        })
    }

    /// 設定
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// カテゴリ割り当てエンジン
    pub fn engine(&self) -> &CategoryEngine {
        &self.engine
    }

    /// パーティション振り分け器
    pub fn partitioner(&self) -> &Partitioner {
        &self.partitioner
    }

    /// ソーステーブルに存在する必要がある列（宣言順、重複なし）
    pub fn required_columns(&self) -> Vec<&str> {
        let config = &self.config;
        let mut columns: Vec<&str> = config.mappings.iter().map(|m| m.source.as_str()).collect();
        columns.push(&config.partition_column);
        if config.stock.enabled {
            columns.push(&config.stock.column);
        }
        columns.push(&config.categories.name_column);
        if let Some(image_column) = &config.categories.image_column {
            columns.push(image_column);
        }
        columns.push(&config.images.option_image);
        columns.push(&config.images.product_images);
        if config.variation.enabled {
            columns.push(&config.variation.color_source);
            columns.push(&config.variation.sku_column);
        }

        let mut unique: Vec<&str> = Vec::with_capacity(columns.len());
        for column in columns {
            if !unique.contains(&column) {
                unique.push(column);
            }
        }
        unique
    }

    /// ソーステーブルのヘッダーを検証する
    ///
    /// # 戻り値
    ///
    /// * `Err(CatalogError::MissingColumns)` - 参照される列が1つ以上存在しない場合
    ///   （欠落しているすべての列を報告する）
    pub fn validate(&self, table: &Table) -> Result<(), CatalogError> {
        let missing = table.missing_columns(self.required_columns());
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::MissingColumns {
                table: "source".to_string(),
                columns: missing,
            })
        }
    }

    /// ソーステーブル全体を変換する
    ///
    /// 検証に失敗した場合は何も処理せずにエラーを返します。
    pub fn process(&self, table: &Table, template: &Template) -> Result<ProcessOutput, CatalogError> {
        self.validate(table)?;
        let plan = self.compile(table, template)?;

        let (rows, stock) = if self.config.stock.enabled {
            let column = source_index(table, &self.config.stock.column)?;
            let (kept, counts) = stock::filter(table.rows.clone(), column);
            info!(
                total = counts.total,
                kept = counts.kept,
                excluded = counts.excluded,
                "filtered products without stock"
            );
            (kept, counts)
        } else {
            info!("stock filtering disabled");
            let counts = stock::bypass(&table.rows);
            (table.rows.clone(), counts)
        };

        let partition_source = source_index(table, &self.config.partition_column)?;
        let groups = self
            .partitioner
            .split(rows, |row| row.get(partition_source).as_raw_string());

        for (spec, rows) in self.partitioner.specs().iter().zip(&groups) {
            info!(partition = %spec.name, rows = rows.len(), "{}", spec.description);
        }

        let mut partitions: Vec<(usize, PartitionOutput)> = groups
            .into_par_iter()
            .enumerate()
            .map(|(index, rows)| {
                let spec = &self.partitioner.specs()[index];
                (index, self.map_partition(&plan, spec, template, &rows))
            })
            .collect();

        partitions.sort_by_key(|(index, _)| *index);

        Ok(ProcessOutput {
            stock,
            partitions: partitions.into_iter().map(|(_, p)| p).collect(),
        })
    }

    fn compile(&self, table: &Table, template: &Template) -> Result<RowPlan, CatalogError> {
        let config = &self.config;

        let mut mappings = Vec::with_capacity(config.mappings.len());
        for mapping in &config.mappings {
            let targets = template.columns_named(&mapping.destination);
            if targets.is_empty() {
                warn!(
                    source = %mapping.source,
                    destination = %mapping.destination,
                    "destination column not found in template, skipping"
                );
                continue;
            }
            mappings.push(MappedColumn {
                source: source_index(table, &mapping.source)?,
                transform: self
                    .registry
                    .get(&mapping.source, &mapping.destination)
                    .cloned(),
                targets,
            });
        }

        let mut fixed = Vec::with_capacity(config.fixed_values.len());
        for value in &config.fixed_values {
            let targets = template.columns_named(&value.column);
            if targets.is_empty() {
                warn!(column = %value.column, "fixed value column not found in template, skipping");
                continue;
            }
            fixed.push((targets, CellValue::text(value.value.as_str())));
        }

        let category_targets = template.columns_named(&config.categories.column);
        if category_targets.is_empty() {
            warn!(column = %config.categories.column, "category column not found in template");
        }

        let images = ImageColumns::locate(template, &config.images);
        if images.detail.is_none() && images.variants.is_empty() {
            warn!("no image columns found in template");
        }

        let image_context_source = match &config.categories.image_column {
            Some(column) => Some(source_index(table, column)?),
            None => None,
        };

        Ok(RowPlan {
            width: template.width(),
            mappings,
            fixed,
            category_targets,
            name_source: source_index(table, &config.categories.name_column)?,
            image_context_source,
            option_image_source: source_index(table, &config.images.option_image)?,
            product_images_source: source_index(table, &config.images.product_images)?,
            images,
            variation: compile_variation(&config.variation, table, template)?,
        })
    }

    fn map_partition(
        &self,
        plan: &RowPlan,
        spec: &PartitionSpec,
        template: &Template,
        rows: &[SourceRow],
    ) -> PartitionOutput {
        let mut table = OutputTable::new(spec.name.clone(), template.header.clone());
        table.rows.reserve(rows.len());
        let mut categories = BTreeMap::new();
        let mut images = ImageStats::default();

        for row in rows {
            let (output, code, image_set, dropped) = self.map_row(plan, row);
            *categories.entry(code).or_insert(0) += 1;
            images.record(&image_set, dropped);
            if dropped > 0 {
                debug!(line = row.line, dropped, "image URLs exceed variant image columns");
            }
            table.rows.push(output);
        }

        if let Some(variation) = &plan.variation {
            fill_variations(variation, &self.config.variation, rows, &mut table.rows);
        }

        debug!(
            partition = %spec.name,
            rows = table.len(),
            categories = categories.len(),
            "mapped partition"
        );

        PartitionOutput {
            spec: spec.clone(),
            table,
            categories,
            images,
        }
    }

    fn map_row(&self, plan: &RowPlan, row: &SourceRow) -> (OutputRow, String, ImageUrlSet, usize) {
        let mut output = vec![CellValue::Empty; plan.width];

        for mapping in &plan.mappings {
            let raw = row.get(mapping.source);
            let value = match &mapping.transform {
                Some(kind) => kind.apply(raw),
                None => raw.clone(),
            };
            for target in &mapping.targets {
                output[*target] = value.clone();
            }
        }

        for (targets, value) in &plan.fixed {
            for target in targets {
                output[*target] = value.clone();
            }
        }

        let name = row.get(plan.name_source).as_raw_string();
        let image_context = plan
            .image_context_source
            .map(|index| row.get(index).as_raw_string());
        let code = self
            .engine
            .assign(&name, image_context.as_deref())
            .to_string();
        for target in &plan.category_targets {
            output[*target] = CellValue::text(code.as_str());
        }

        let image_set = ImageUrlSet::resolve(
            row.get(plan.option_image_source),
            row.get(plan.product_images_source),
        );
        let dropped = plan.images.fan_out(&image_set, &mut output);

        (output, code, image_set, dropped)
    }
}

fn source_index(table: &Table, column: &str) -> Result<usize, CatalogError> {
    table
        .column_index(column)
        .ok_or_else(|| CatalogError::MissingColumns {
            table: "source".to_string(),
            columns: vec![column.to_string()],
        })
}

fn compile_variation(
    config: &VariationConfig,
    table: &Table,
    template: &Template,
) -> Result<Option<VariationPlan>, CatalogError> {
    if !config.enabled {
        return Ok(None);
    }

    let color_targets = template.columns_named(&config.color_column);
    let theme_targets = template.columns_named(&config.theme_column);
    if color_targets.is_empty() || theme_targets.is_empty() {
        warn!(
            color = %config.color_column,
            theme = %config.theme_column,
            "variation columns not found in template, skipping color fill"
        );
        return Ok(None);
    }

    Ok(Some(VariationPlan {
        color_source: source_index(table, &config.color_source)?,
        sku_source: source_index(table, &config.sku_column)?,
        color_targets,
        theme_targets,
    }))
}

/// カラー未設定の行にバリエーションテーマとカラーを設定する
///
/// 同じ基本コードを持つ行がパーティション内に1行だけなら`single_label`、
/// 複数あればグループ内の出現順に`"{numbered_prefix} 1"`, `"{numbered_prefix} 2"`, ...を設定します。
fn fill_variations(
    plan: &VariationPlan,
    config: &VariationConfig,
    rows: &[SourceRow],
    output: &mut [OutputRow],
) {
    let base_codes: Vec<String> = rows
        .iter()
        .map(|row| sku_base_code(row.get(plan.sku_source)))
        .collect();

    let mut group_sizes: HashMap<&str, usize> = HashMap::new();
    for code in &base_codes {
        *group_sizes.entry(code.as_str()).or_insert(0) += 1;
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut filled = 0usize;
    for ((row, code), out) in rows.iter().zip(&base_codes).zip(output.iter_mut()) {
        if !row.get(plan.color_source).is_empty() {
            continue;
        }

        let label = if group_sizes.get(code.as_str()).copied().unwrap_or(0) > 1 {
            let n = seen.entry(code.as_str()).or_insert(0);
            *n += 1;
            format!("{} {}", config.numbered_prefix, n)
        } else {
            config.single_label.clone()
        };

        for target in &plan.theme_targets {
            out[*target] = CellValue::text(config.theme_value.as_str());
        }
        for target in &plan.color_targets {
            out[*target] = CellValue::text(label.as_str());
        }
        filled += 1;
    }

    if filled > 0 {
        debug!(rows = filled, "filled missing colors");
    }
}
