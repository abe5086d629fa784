//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use serde::Serialize;

/// セルの値を表す列挙型
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// 数値（f64）
    Number(f64),

    /// 文字列
    String(String),

    /// 論理値
    Bool(bool),

    /// 空セル
    Empty,
}

impl CellValue {
    /// 文字列セルを生成する
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::String(s.into())
    }

    /// 値が空かどうかを判定
    ///
    /// 空白のみの文字列も空として扱います。
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 値を文字列として取得（書式適用前）
    ///
    /// 整数値の数値は小数点なしで表現します（`5.0` → `"5"`）。
    pub fn as_raw_string(&self) -> String {
        match self {
            CellValue::Number(n) => format_number(*n),
            CellValue::String(s) => s.clone(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Empty => String::new(),
        }
    }

    /// 値を数値として解釈する
    ///
    /// 文字列は前後の空白を除いて`f64`として解析します。
    /// 解析できない場合や空セルの場合は`None`を返します。
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// 数値を表示用の文字列に変換する
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// ソーステーブルの1行（1商品）
///
/// セルはヘッダーと同じ順序で格納されます。読み込み後は変更されません。
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRow {
    /// ワークシート上の行番号（0始まり、診断用）
    pub line: u32,

    /// セル値（ヘッダー順）
    pub cells: Vec<CellValue>,
}

impl SourceRow {
    /// 新しい行を生成
    pub fn new(line: u32, cells: Vec<CellValue>) -> Self {
        Self { line, cells }
    }

    /// 列インデックスでセル値を取得する
    ///
    /// 行がヘッダーより短い場合は空セルとして扱います。
    pub fn get(&self, index: usize) -> &CellValue {
        self.cells.get(index).unwrap_or(&CellValue::Empty)
    }
}

/// ヘッダー付きのソーステーブル
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// 列名（ヘッダー行）
    pub header: Vec<String>,

    /// データ行
    pub rows: Vec<SourceRow>,
}

impl Table {
    /// 新しいテーブルを生成
    pub fn new(header: Vec<String>, rows: Vec<SourceRow>) -> Self {
        Self { header, rows }
    }

    /// 列名からインデックスを取得する（大文字・小文字を区別する完全一致）
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// 指定された列がヘッダーに存在しない列名を宣言順に返す
    pub fn missing_columns<'a, I>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut missing: Vec<String> = Vec::new();
        for name in names {
            if self.column_index(name).is_none() && !missing.iter().any(|m| m == name) {
                missing.push(name.to_string());
            }
        }
        missing
    }

    /// 指定した行と列名の値を取得する
    pub fn value<'a>(&self, row: &'a SourceRow, column: &str) -> &'a CellValue {
        match self.column_index(column) {
            Some(index) => row.get(index),
            None => &CellValue::Empty,
        }
    }
}

/// 出力テンプレート
///
/// データ開始行より前のすべての行（ヘッダー行を含む）を定型行として保持します。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    /// データ開始行より前の行（そのまま再出力される）
    pub leading_rows: Vec<Vec<CellValue>>,

    /// 出力列名（列の順序と幅を定義する）
    pub header: Vec<String>,
}

impl Template {
    /// ヘッダーだけを持つテンプレートを生成
    pub fn from_header(header: Vec<String>) -> Self {
        let row = header.iter().map(|h| CellValue::text(h.as_str())).collect();
        Self {
            leading_rows: vec![row],
            header,
        }
    }

    /// 出力の列数
    pub fn width(&self) -> usize {
        self.header.len()
    }

    /// 指定した列名を持つすべての列インデックス
    ///
    /// テンプレートには同名の列が複数存在することがあります（例: `Quantity`）。
    pub fn columns_named(&self, name: &str) -> Vec<usize> {
        self.header
            .iter()
            .enumerate()
            .filter(|(_, h)| h.as_str() == name)
            .map(|(i, _)| i)
            .collect()
    }
}

/// 出力テーブルの1行（テンプレートの列幅と同じ長さ）
pub type OutputRow = Vec<CellValue>;

/// パーティションごとの出力テーブル
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputTable {
    /// パーティション名
    pub name: String,

    /// 出力列名
    pub header: Vec<String>,

    /// データ行（ソースの相対順序を保持）
    pub rows: Vec<OutputRow>,
}

impl OutputTable {
    /// 空の出力テーブルを生成
    pub fn new(name: impl Into<String>, header: Vec<String>) -> Self {
        Self {
            name: name.into(),
            header,
            rows: Vec::new(),
        }
    }

    /// 行数
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 行が存在しないかどうか
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 最初に見つかった指定列の値を行ごとに返す
    pub fn column_values(&self, name: &str) -> Vec<&CellValue> {
        match self.header.iter().position(|h| h == name) {
            Some(index) => self.rows.iter().map(|row| &row[index]).collect(),
            None => Vec::new(),
        }
    }
}
