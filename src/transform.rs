//! Field Transform Module
//!
//! セル値を別のセル値に変換する純粋関数群と、その登録表を提供するモジュール。
//! すべての変換は全域関数であり、パニックもエラーも発生させません。
//! 解析できない入力に対しては空文字列を返します。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthChar;

use crate::api::TransformKind;
use crate::error::CatalogError;
use crate::types::{format_number, CellValue};

/// 価格から除去する通貨記号
const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₩', '₹', '¢'];

/// 定価の倍率
const LIST_PRICE_MULTIPLIER: f64 = 1.25;

/// 最低価格
const MIN_PRICE: f64 = 0.01;

impl TransformKind {
    /// セル値に変換を適用する
    pub fn apply(&self, value: &CellValue) -> CellValue {
        match self {
            TransformKind::Price => CellValue::String(normalize_price(value)),
            TransformKind::SkuBaseCode => CellValue::String(sku_base_code(value)),
            TransformKind::NameCleanup { max_width } => {
                CellValue::String(clean_name(value, *max_width))
            }
            TransformKind::BasePrice => match parse_price(value) {
                Some(price) => CellValue::Number(base_price(price)),
                None => CellValue::String(String::new()),
            },
            TransformKind::ListPrice => match parse_price(value) {
                Some(price) => CellValue::Number(list_price(price)),
                None => CellValue::String(String::new()),
            },
        }
    }
}

/// 価格の正規化
///
/// 通貨記号と前後の空白を除去します。空セルは空文字列になります。
/// 数値としての内容は変更しません（`"$12.50 "` → `"12.50"`）。
pub fn normalize_price(value: &CellValue) -> String {
    match value {
        CellValue::Empty | CellValue::Bool(_) => String::new(),
        CellValue::Number(n) if !n.is_finite() => String::new(),
        CellValue::Number(n) => format_number(*n),
        CellValue::String(s) => s
            .chars()
            .filter(|c| !CURRENCY_SYMBOLS.contains(c))
            .collect::<String>()
            .trim()
            .to_string(),
    }
}

/// 正規化した価格を数値として解析する
fn parse_price(value: &CellValue) -> Option<f64> {
    let normalized = normalize_price(value);
    normalized
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite())
}

/// SKUから基本コードを得る
///
/// 末尾の連続したアルファベット（最長一致）を除去します。
/// 末尾がアルファベットでない場合はそのまま返します。
/// コード全体がアルファベットの場合は全体が除去され、空文字列になります。
///
/// # 例
///
/// - `"HBG100PN"` → `"HBG100"`
/// - `"HBG200"` → `"HBG200"`
/// - `"ABC"` → `""`
/// - `""` → `""`
pub fn sku_base_code(value: &CellValue) -> String {
    let code = value.as_raw_string();
    let code = code.trim();

    let body_len = code
        .char_indices()
        .rev()
        .find(|(_, c)| !c.is_ascii_alphabetic())
        .map(|(i, c)| i + c.len_utf8());

    match body_len {
        Some(len) => code[..len].to_string(),
        None => String::new(),
    }
}

/// 表示名の整形
///
/// 連続する空白（改行・タブを含む）を1つの半角スペースにまとめ、前後の空白を除去します。
/// `max_width`が指定された場合は、表示幅がそれを超えないように末尾を切り詰めます。
pub fn clean_name(value: &CellValue, max_width: Option<usize>) -> String {
    let raw = value.as_raw_string();
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    let Some(max_width) = max_width else {
        return normalized;
    };

    let mut width = 0;
    let mut result = String::with_capacity(normalized.len());
    for c in normalized.chars() {
        let char_width = c.width().unwrap_or(0);
        if width + char_width > max_width {
            break;
        }
        width += char_width;
        result.push(c);
    }
    result.trim_end().to_string()
}

/// 基本価格: 小数点以下を切り捨てて1セント引く（最低0.01）
pub fn base_price(price: f64) -> f64 {
    round_cents((price.floor() - 0.01).max(MIN_PRICE))
}

/// 定価: 1.25倍して切り捨て、1セント引く（基本価格より必ず高い）
pub fn list_price(price: f64) -> f64 {
    let base = base_price(price);
    let list = (price * LIST_PRICE_MULTIPLIER).floor() - 0.01;
    round_cents(list.max(base + MIN_PRICE))
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 変換の登録エントリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformEntry {
    /// ソース列名
    pub source: String,

    /// 出力列名
    pub destination: String,

    /// 変換方式
    pub transform: TransformKind,
}

impl TransformEntry {
    /// 新しいエントリを生成
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        transform: TransformKind,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            transform,
        }
    }
}

/// 変換の登録表
///
/// 変換は(ソース列, 出力列)の組をキーとして登録されます。
/// 同じソース列が複数の出力列に対応する場合でも、出力列ごとに異なる変換を適用できます。
#[derive(Debug, Clone, Default)]
pub struct TransformRegistry {
    entries: HashMap<(String, String), TransformKind>,
}

impl TransformRegistry {
    /// エントリのリストから登録表を構築する
    ///
    /// # 戻り値
    ///
    /// * `Err(CatalogError::Config)` - 同じ(ソース列, 出力列)の組に複数の変換が登録されている場合
    pub fn from_entries(entries: &[TransformEntry]) -> Result<Self, CatalogError> {
        let mut map = HashMap::with_capacity(entries.len());
        for entry in entries {
            let key = (entry.source.clone(), entry.destination.clone());
            if map.insert(key, entry.transform.clone()).is_some() {
                return Err(CatalogError::Config(format!(
                    "Duplicate transform for '{}' -> '{}'",
                    entry.source, entry.destination
                )));
            }
        }
        Ok(Self { entries: map })
    }

    /// 登録されている変換を取得する
    pub fn get(&self, source: &str, destination: &str) -> Option<&TransformKind> {
        self.entries
            .get(&(source.to_string(), destination.to_string()))
    }

    /// 変換を適用する（未登録の場合は値をそのままコピー）
    pub fn apply(&self, source: &str, destination: &str, value: &CellValue) -> CellValue {
        match self.get(source, destination) {
            Some(kind) => kind.apply(value),
            None => value.clone(),
        }
    }

    /// 登録数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 登録が存在しないかどうか
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
