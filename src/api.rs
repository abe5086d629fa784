//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

use serde::{Deserialize, Serialize};

/// セル値の変換方式（Strategy）
///
/// `TransformRegistry`に(ソース列, 出力列)の組ごとに1つ登録されます。
/// 各変換は全域関数であり、解析できない入力に対しては空文字列を返します。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[non_exhaustive]
pub enum TransformKind {
    /// 通貨記号と前後の空白を除去する
    ///
    /// 例: `"$12.50 "` → `"12.50"`
    Price,

    /// SKU末尾のアルファベット部分を除去して基本コードを得る
    ///
    /// 例: `"HBG100PN"` → `"HBG100"`
    SkuBaseCode,

    /// 表示名の空白を正規化し、必要に応じて表示幅で切り詰める
    ///
    /// `max_width`が`None`の場合は切り詰めません。
    NameCleanup {
        /// 最大表示幅（全角文字は幅2として数える）
        #[serde(default)]
        max_width: Option<usize>,
    },

    /// 基本価格: `max(0.01, floor(p) - 0.01)`
    BasePrice,

    /// 定価: `max(基本価格 + 0.01, floor(p * 1.25) - 0.01)`
    ListPrice,
}

/// 出力フォーマット
///
/// パーティションごとの出力テーブルを書き出す形式を指定します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum OutputFormat {
    /// xlsx形式（デフォルト）
    ///
    /// テンプレートの定型行をそのまま再出力し、その後にデータ行を書き込みます。
    #[default]
    Xlsx,

    /// CSV形式
    ///
    /// ヘッダー行とデータ行のみを出力します（定型行は含めません）。
    Csv,

    /// JSON形式
    ///
    /// 同名の列が存在しうるため、各行はヘッダー順の配列として出力します。
    Json,
}

impl OutputFormat {
    /// 出力ファイルの拡張子
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlsx" => Ok(OutputFormat::Xlsx),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown output format '{}' (expected xlsx, csv or json)", other)),
        }
    }
}

/// シート選択方式
///
/// ソース・テンプレートのどちらのシートを読むかを指定します。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetSelector {
    /// インデックス指定（0始まり）
    Index(usize),

    /// シート名指定
    ///
    /// 例: `SheetSelector::Name("Products".to_string())`
    Name(String),
}

impl std::fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetSelector::Index(index) => write!(f, "#{}", index),
            SheetSelector::Name(name) => write!(f, "'{}'", name),
        }
    }
}
