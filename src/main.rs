//! CLI Module
//!
//! Faireの商品カタログをTemuのアップロードテンプレートへ変換するコマンドラインインターフェースです。
//!
//! ヘルプ文字列はエラーメッセージと同じく英語で表示します。

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use sheetbridge::reader::WorkbookReader;
use sheetbridge::{Config, OutputFormat, PipelineBuilder};

/// コマンドライン引数
#[derive(Parser)]
#[command(name = "sheetbridge")]
#[command(about = "Map a Faire product catalog into Temu upload templates", long_about = None)]
struct Cli {
    /// デバッグログを有効化（`RUST_LOG`が優先）
    #[arg(
        short,
        long,
        global = true,
        default_value_t = false,
        help = "Enable debug logging (RUST_LOG takes precedence)",
    )]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

/// サブコマンド
#[derive(Subcommand)]
enum Command {
    /// パーティションごとのテンプレートファイルへ変換
    #[command(about = "Convert a source catalog into one template file per partition")]
    Convert {
        /// Faireの商品エクスポート（xlsx、xls、ods）
        #[arg(long, help = "Faire product export (xlsx, xls or ods)")]
        source: PathBuf,
        /// Temuのアップロードテンプレート
        #[arg(long, help = "Temu upload template")]
        template: PathBuf,
        /// JSON設定ファイル（省略時は組み込みの既定値）
        #[arg(long, help = "JSON configuration; built-in defaults when omitted")]
        config: Option<PathBuf>,
        /// 在庫が0以下の商品も出力する
        #[arg(
            long,
            default_value_t = false,
            help = "Keep products whose on-hand inventory is zero or negative",
        )]
        no_filter_stock: bool,
        /// 更新用ファイル（`_update`）を生成しない
        #[arg(long, default_value_t = false, help = "Skip the \"_update\" companion files")]
        no_update_files: bool,
        /// 出力形式
        #[arg(long, help = "Output format: xlsx, csv or json")]
        format: Option<OutputFormat>,
        /// 1ファイルあたりの最大データ行数
        #[arg(long, help = "Maximum data rows per output file")]
        chunk_size: Option<usize>,
        /// すべての出力ファイルの出力先（設定のディレクトリを上書き）
        #[arg(long, help = "Directory for all output files (overrides configured directories)")]
        output_dir: Option<PathBuf>,
        /// 実行レポートをJSONで標準出力へ出力
        #[arg(long, default_value_t = false, help = "Print the run report as JSON on stdout")]
        report: bool,
    },
    /// ソースとテンプレートのヘッダー列を一覧表示
    #[command(about = "List the header columns of the source and template workbooks")]
    Columns {
        #[arg(long)]
        source: PathBuf,
        #[arg(long)]
        template: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// 商品名ごとのカテゴリコードを表示
    #[command(about = "Print the category code assigned to each product name")]
    Categorize {
        /// 判定する商品名
        #[arg(required = true, help = "Product names to classify")]
        names: Vec<String>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// カテゴリルールを評価順に一覧表示
    #[command(about = "List every category rule in evaluation order")]
    Categories {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// 組み込みの設定をJSONで出力
    #[command(about = "Print the built-in configuration as JSON")]
    DefaultConfig,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "sheetbridge=debug,info"
    } else {
        "sheetbridge=info,warn"
    };
    let ansi = std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    tracing_subscriber::fmt()
        .with_ansi(ansi)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    match cli.command {
        Command::Convert {
            source,
            template,
            config,
            no_filter_stock,
            no_update_files,
            format,
            chunk_size,
            output_dir,
            report,
        } => {
            let mut builder = PipelineBuilder::new()
                .with_config(load_config(config.as_deref())?)
                .with_stock_filter(!no_filter_stock)
                .with_update_variant(!no_update_files);
            if let Some(format) = format {
                builder = builder.with_output_format(format);
            }
            if let Some(chunk_size) = chunk_size {
                builder = builder.with_chunk_size(chunk_size);
            }
            if let Some(dir) = output_dir {
                builder = builder.with_output_dir(dir);
            }

            let pipeline = builder.build().context("invalid configuration")?;
            let run = pipeline.run(&source, &template).with_context(|| {
                format!(
                    "conversion of {} into {} failed",
                    source.display(),
                    template.display()
                )
            })?;

            if report {
                println!("{}", run.to_json()?);
            } else {
                for path in run.files_written() {
                    println!("{}", path.display());
                }
            }
        }
        Command::Columns {
            source,
            template,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            let mut reader = WorkbookReader::open_path(&source, config.max_input_file_size)
                .with_context(|| format!("failed to open {}", source.display()))?;
            let table = reader.read_table(&config.source)?;
            println!("source ({}):", source.display());
            for (index, name) in table.header.iter().enumerate() {
                println!("  {:>3}  {}", index, name);
            }

            let mut reader = WorkbookReader::open_path(&template, config.max_input_file_size)
                .with_context(|| format!("failed to open {}", template.display()))?;
            let layout = reader.read_template(&config.template)?;
            println!("template ({}):", template.display());
            for (index, name) in layout.header.iter().enumerate() {
                println!("  {:>3}  {}", index, name);
            }
        }
        Command::Categorize { names, config } => {
            let engine = load_config(config.as_deref())?.category_engine()?;
            for name in &names {
                let code = engine.assign(name, None);
                let description = engine.describe(code).unwrap_or_default();
                println!("{}\t{}\t{}", code, description, name);
            }
        }
        Command::Categories { config } => {
            let engine = load_config(config.as_deref())?.category_engine()?;
            for rule in engine.rules() {
                let keywords: Vec<String> =
                    rule.all_of.iter().map(|set| set.join("|")).collect();
                println!("{}\t{}\t{}", rule.code, rule.description, keywords.join(" & "));
            }
            println!(
                "{}\t{}\t(default)",
                engine.default_code(),
                engine.describe(engine.default_code()).unwrap_or_default()
            );
        }
        Command::DefaultConfig => {
            println!("{}", Config::default().to_json()?);
        }
    }
    Ok(())
}

/// 設定ファイルを読み込む（パス省略時は既定値）
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(Config::default()),
    }
}
