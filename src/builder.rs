//! Builder Module
//!
//! Fluent Builder APIを提供し、`Pipeline`インスタンスを段階的に構築する。

use std::io::Read;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::info;

use crate::api::{OutputFormat, SheetSelector};
use crate::config::Config;
use crate::error::CatalogError;
use crate::output::{self, OutputWriter, RenderedFile};
use crate::pipeline::{MappingPipeline, ProcessOutput};
use crate::reader::WorkbookReader;
use crate::report::{PartitionReport, RunReport};
use crate::types::{Table, Template};
use crate::variant;

/// Fluent Builder APIを提供する構造体
///
/// `Pipeline`インスタンスを段階的に構築するためのビルダーです。
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use sheetbridge::{OutputFormat, PipelineBuilder};
///
/// # fn main() -> Result<(), sheetbridge::CatalogError> {
/// let pipeline = PipelineBuilder::new()
///     .with_stock_filter(false)
///     .with_output_format(OutputFormat::Csv)
///     .with_output_dir("output")
///     .build()?;
/// let report = pipeline.run("faire_products.xlsx", "temu_template.xlsx")?;
/// println!("{} rows written", report.total_rows());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    /// 内部設定（構築中）
    config: Config,
}

impl PipelineBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - 在庫フィルタ: 有効
    /// - 更新用ファイル: 生成する
    /// - 出力フォーマット: xlsx
    /// - チャンクサイズ: 1000行
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// 設定全体を置き換える
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// 在庫フィルタの有効・無効を設定する
    pub fn with_stock_filter(mut self, enabled: bool) -> Self {
        self.config.stock.enabled = enabled;
        self
    }

    /// 更新用ファイルを生成するかどうかを設定する
    pub fn with_update_variant(mut self, enabled: bool) -> Self {
        self.config.update_variant.enabled = enabled;
        self
    }

    /// 出力フォーマットを設定する
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.config.output.format = format;
        self
    }

    /// 1ファイルあたりの最大行数を設定する
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.output.chunk_size = chunk_size;
        self
    }

    /// 出力ディレクトリを設定する
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output.dir = Some(dir.into());
        self
    }

    /// ソースのシートを選択する
    pub fn with_source_sheet(mut self, sheet: SheetSelector) -> Self {
        self.config.source.sheet = sheet;
        self
    }

    /// テンプレートのシートを選択する
    pub fn with_template_sheet(mut self, sheet: SheetSelector) -> Self {
        self.config.template.sheet = sheet;
        self
    }

    /// 最大入力ファイルサイズ（バイト）を設定する
    pub fn with_max_input_file_size(mut self, bytes: u64) -> Self {
        self.config.max_input_file_size = bytes;
        self
    }

    /// 設定を検証し、`Pipeline`インスタンスを生成する
    ///
    /// # 戻り値
    ///
    /// * `Err(CatalogError::Config)` - 設定が無効な場合
    pub fn build(self) -> Result<Pipeline, CatalogError> {
        Ok(Pipeline {
            mapping: MappingPipeline::new(self.config)?,
        })
    }
}

/// 変換処理のファサード
///
/// ソースとテンプレートを読み込み、変換結果をパーティションごとのファイルに書き出します。
/// 検証エラーが発生した場合、ファイルは1つも書き込まれません。
#[derive(Debug, Clone)]
pub struct Pipeline {
    mapping: MappingPipeline,
}

impl Pipeline {
    /// 設定
    pub fn config(&self) -> &Config {
        self.mapping.config()
    }

    /// 内部の列変換パイプライン
    pub fn mapping(&self) -> &MappingPipeline {
        &self.mapping
    }

    /// メモリ上のテーブルを変換する（ファイルは書き込まない）
    pub fn process(&self, table: &Table, template: &Template) -> Result<ProcessOutput, CatalogError> {
        self.mapping.process(table, template)
    }

    /// ファイルパスを指定して変換を実行する
    ///
    /// # 処理フロー
    ///
    /// 1. ソースとテンプレートの読み込み
    /// 2. 検証と変換（メモリ上）
    /// 3. すべての出力ファイルの生成（メモリ上）
    /// 4. ファイルの書き込み
    pub fn run(
        &self,
        source_path: impl AsRef<Path>,
        template_path: impl AsRef<Path>,
    ) -> Result<RunReport, CatalogError> {
        let max = self.config().max_input_file_size;
        let source = WorkbookReader::open_path(source_path.as_ref(), max)?;
        let template = WorkbookReader::open_path(template_path.as_ref(), max)?;
        info!(
            source = %source_path.as_ref().display(),
            template = %template_path.as_ref().display(),
            "loaded workbooks"
        );
        self.run_workbooks(source, template)
    }

    /// 任意のリーダーを指定して変換を実行する
    pub fn run_readers<S: Read, T: Read>(&self, source: S, template: T) -> Result<RunReport, CatalogError> {
        let max = self.config().max_input_file_size;
        let source = WorkbookReader::from_reader(source, max)?;
        let template = WorkbookReader::from_reader(template, max)?;
        self.run_workbooks(source, template)
    }

    fn run_workbooks(
        &self,
        mut source: WorkbookReader,
        mut template: WorkbookReader,
    ) -> Result<RunReport, CatalogError> {
        let config = self.config();
        let table = source.read_table(&config.source)?;
        let template = template.read_template(&config.template)?;

        let processed = self.process(&table, &template)?;
        let (files, report) = self.render(&processed, &template)?;

        output::write_all(&files)?;
        for file in &files {
            info!(path = %file.path.display(), rows = file.rows, "wrote file");
        }
        report.log();
        Ok(report)
    }

    /// 変換結果をすべてメモリ上でファイルの内容に変換する
    ///
    /// パーティションごとに並列に生成し、宣言順に並べ替えて返します。
    pub fn render(
        &self,
        processed: &ProcessOutput,
        template: &Template,
    ) -> Result<(Vec<RenderedFile>, RunReport), CatalogError> {
        let config = self.config();
        let writer = OutputWriter::from_format(config.output.format);
        let sheet_name = match &config.template.sheet {
            SheetSelector::Name(name) => name.as_str(),
            SheetSelector::Index(_) => "Template",
        };

        let rendered: Result<Vec<(usize, Vec<RenderedFile>, PartitionReport)>, CatalogError> = processed
            .partitions
            .par_iter()
            .enumerate()
            .map(|(index, partition)| {
                let base = output::output_path(
                    &partition.spec.output,
                    config.output.dir.as_deref(),
                    config.output.format,
                );

                let mut files = output::render_chunks(
                    writer,
                    template,
                    sheet_name,
                    &partition.table,
                    &base,
                    config.output.chunk_size,
                )?;

                let mut update_files = Vec::new();
                if config.update_variant.enabled {
                    let update = variant::derive(&partition.table, &config.update_variant);
                    update_files = output::render_chunks(
                        writer,
                        template,
                        sheet_name,
                        &update,
                        &variant::update_path(&base, &config.update_variant.suffix),
                        config.output.chunk_size,
                    )?;
                }

                let report = PartitionReport {
                    name: partition.spec.name.clone(),
                    description: partition.spec.description.clone(),
                    rows: partition.table.len(),
                    files: files.iter().map(|f| f.path.clone()).collect(),
                    update_files: update_files.iter().map(|f| f.path.clone()).collect(),
                };
                files.append(&mut update_files);
                Ok((index, files, report))
            })
            .collect();

        let mut rendered = rendered?;
        rendered.sort_by_key(|(index, _, _)| *index);

        let mut files = Vec::new();
        let mut partitions = Vec::with_capacity(rendered.len());
        for (_, mut partition_files, report) in rendered {
            files.append(&mut partition_files);
            partitions.push(report);
        }
        output::ensure_unique_paths(&files)?;

        let report = RunReport {
            stock_filter_enabled: config.stock.enabled,
            stock: processed.stock,
            partitions,
            categories: RunReport::category_counts(&processed.category_histogram(), self.mapping.engine()),
            images: processed.image_stats(),
        };

        Ok((files, report))
    }
}
