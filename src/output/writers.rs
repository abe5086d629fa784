//! Output Writers Implementation
//!
//! 各出力フォーマットの実装を提供するモジュール。
//! すべてのライターはファイルに直接書き込まず、バイト列を返します。

use rust_xlsxwriter::{Workbook, Worksheet};
use serde_json::json;

use crate::error::CatalogError;
use crate::types::{CellValue, OutputRow, Template};

/// xlsx形式のライター
///
/// テンプレートの定型行を同じ位置に再出力し、データ行をデータ開始行から書き込みます。
/// テンプレートの書式（列幅、色、入力規則など）は再現しません。
pub struct XlsxWriter;

impl XlsxWriter {
    pub fn render(
        &self,
        template: &Template,
        sheet_name: &str,
        rows: &[OutputRow],
    ) -> Result<Vec<u8>, CatalogError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name)?;

        for (row_idx, row) in template.leading_rows.iter().enumerate() {
            write_row(worksheet, row_idx, row)?;
        }

        let data_start = template.leading_rows.len();
        for (offset, row) in rows.iter().enumerate() {
            write_row(worksheet, data_start + offset, row)?;
        }

        Ok(workbook.save_to_buffer()?)
    }
}

fn write_row(worksheet: &mut Worksheet, row: usize, cells: &[CellValue]) -> Result<(), CatalogError> {
    let row = u32::try_from(row)
        .map_err(|_| CatalogError::Config(format!("Row index {} exceeds xlsx limits", row)))?;

    for (col, cell) in cells.iter().enumerate() {
        let col = u16::try_from(col)
            .map_err(|_| CatalogError::Config(format!("Column index {} exceeds xlsx limits", col)))?;
        match cell {
            CellValue::Number(n) => {
                worksheet.write_number(row, col, *n)?;
            }
            CellValue::String(s) if !s.is_empty() => {
                worksheet.write_string(row, col, s)?;
            }
            CellValue::Bool(b) => {
                worksheet.write_boolean(row, col, *b)?;
            }
            CellValue::String(_) | CellValue::Empty => {}
        }
    }
    Ok(())
}

/// CSV形式のライター
///
/// ヘッダー行とデータ行のみを出力します。
pub struct CsvWriter;

impl CsvWriter {
    pub fn render(&self, header: &[String], rows: &[OutputRow]) -> Result<Vec<u8>, CatalogError> {
        let mut out = String::new();

        let header_line: Vec<String> = header.iter().map(|h| escape_csv(h)).collect();
        out.push_str(&header_line.join(","));
        out.push('\n');

        for row in rows {
            let line: Vec<String> = row
                .iter()
                .map(|cell| escape_csv(&cell.as_raw_string()))
                .collect();
            out.push_str(&line.join(","));
            out.push('\n');
        }

        Ok(out.into_bytes())
    }
}

/// JSON形式のライター
///
/// 同名の列が存在しうるため、行はオブジェクトではなくヘッダー順の配列として出力します。
pub struct JsonWriter;

impl JsonWriter {
    pub fn render(
        &self,
        name: &str,
        header: &[String],
        rows: &[OutputRow],
    ) -> Result<Vec<u8>, CatalogError> {
        let document = json!({
            "name": name,
            "header": header,
            "rows": rows,
        });

        let mut buffer = serde_json::to_vec_pretty(&document)?;
        buffer.push(b'\n');
        Ok(buffer)
    }
}

/// CSV文字列をエスケープ
///
/// ダブルクォート、改行、カンマを含む場合はダブルクォートで囲み、
/// 内部のダブルクォートは2つにエスケープします。
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
