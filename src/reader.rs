//! Workbook Reader Module
//!
//! calamineを使用してソースとテンプレートのワークブックを読み込むモジュール。
//! xlsx / xls / ods を自動判別します。

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use tracing::debug;

use crate::api::SheetSelector;
use crate::config::{SourceLayout, TemplateLayout};
use crate::error::CatalogError;
use crate::types::{CellValue, SourceRow, Table, Template};

/// ワークブックリーダー
///
/// 入力全体をメモリに読み込んでから解析します。
/// 読み込み時に入力サイズの上限を検査します。
pub struct WorkbookReader {
    sheets: Sheets<Cursor<Vec<u8>>>,
}

impl WorkbookReader {
    /// ファイルパスからワークブックを開く
    ///
    /// # 戻り値
    ///
    /// * `Err(CatalogError::FileAccess)` - ファイルを開けない場合
    /// * `Err(CatalogError::SecurityViolation)` - ファイルサイズが上限を超える場合
    /// * `Err(CatalogError::Parse)` - ワークブックとして解析できない場合
    pub fn open_path(path: impl AsRef<Path>, max_input_size: u64) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| CatalogError::file_access(path, e))?;
        debug!(path = %path.display(), "opening workbook");
        Self::from_reader(file, max_input_size)
    }

    /// 任意のリーダーからワークブックを開く
    pub fn from_reader<R: Read>(reader: R, max_input_size: u64) -> Result<Self, CatalogError> {
        let mut buffer = Vec::new();
        let bytes_read = reader
            .take(max_input_size.saturating_add(1))
            .read_to_end(&mut buffer)?;

        if bytes_read as u64 > max_input_size {
            return Err(CatalogError::SecurityViolation(format!(
                "Input file size exceeds maximum: more than {} bytes",
                max_input_size
            )));
        }

        let sheets = open_workbook_auto_from_rs(Cursor::new(buffer))?;
        Ok(Self { sheets })
    }

    /// すべてのシート名
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    /// シート選択方式からシート名を決定する
    ///
    /// # 戻り値
    ///
    /// * `Err(CatalogError::Config)` - シートが見つからない、またはインデックスが範囲外の場合
    pub fn select_sheet(&self, selector: &SheetSelector) -> Result<String, CatalogError> {
        let names = self.sheet_names();
        match selector {
            SheetSelector::Index(index) => names.get(*index).cloned().ok_or_else(|| {
                CatalogError::Config(format!(
                    "Sheet index {} is out of range (total: {})",
                    index,
                    names.len()
                ))
            }),
            SheetSelector::Name(name) => {
                if names.contains(name) {
                    Ok(name.clone())
                } else {
                    Err(CatalogError::Config(format!(
                        "Sheet '{}' not found (available: {})",
                        name,
                        names.join(", ")
                    )))
                }
            }
        }
    }

    /// ソーステーブルを読み込む
    ///
    /// ヘッダー行の直後の`skip_rows`行は説明行として読み飛ばします。
    /// すべてのセルが空の行は商品として扱いません。
    pub fn read_table(&mut self, layout: &SourceLayout) -> Result<Table, CatalogError> {
        let grid = self.sheet_grid(&layout.sheet)?;
        let header = header_row(&grid, layout.header_row, &layout.sheet)?;

        let first_data_row = layout.header_row as usize + 1 + layout.skip_rows as usize;
        let rows: Vec<SourceRow> = grid
            .into_iter()
            .enumerate()
            .skip(first_data_row)
            .filter(|(_, cells)| cells.iter().any(|c| !c.is_empty()))
            .map(|(index, mut cells)| {
                cells.resize(header.len(), CellValue::Empty);
                SourceRow::new(index as u32, cells)
            })
            .collect();

        debug!(
            sheet = %layout.sheet,
            columns = header.len(),
            rows = rows.len(),
            "read source table"
        );
        Ok(Table::new(header, rows))
    }

    /// テンプレートを読み込む
    ///
    /// `data_start_row`より前のすべての行を定型行として保持します。
    pub fn read_template(&mut self, layout: &TemplateLayout) -> Result<Template, CatalogError> {
        let mut grid = self.sheet_grid(&layout.sheet)?;
        let header = header_row(&grid, layout.header_row, &layout.sheet)?;

        grid.resize(layout.data_start_row as usize, Vec::new());
        for row in grid.iter_mut() {
            row.truncate(header.len());
        }

        debug!(sheet = %layout.sheet, columns = header.len(), "read template");
        Ok(Template {
            leading_rows: grid,
            header,
        })
    }

    /// シートを絶対座標のグリッドとして読み込む
    ///
    /// calamineの`Range`は最初の非空セルから始まるため、開始位置まで空セルで埋めます。
    fn sheet_grid(&mut self, selector: &SheetSelector) -> Result<Vec<Vec<CellValue>>, CatalogError> {
        let name = self.select_sheet(selector)?;
        let range = self.sheets.worksheet_range(&name)?;
        Ok(to_grid(&range))
    }
}

fn to_grid(range: &Range<Data>) -> Vec<Vec<CellValue>> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };

    let mut grid: Vec<Vec<CellValue>> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![CellValue::Empty; start_col as usize];
        cells.extend(row.iter().map(convert_cell));
        grid.push(cells);
    }
    grid
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Empty | Data::Error(_) => CellValue::Empty,
        other => CellValue::String(other.to_string()),
    }
}

/// ヘッダー行を列名のリストとして取得する（末尾の空の列は除く）
fn header_row(
    grid: &[Vec<CellValue>],
    row: u32,
    sheet: &SheetSelector,
) -> Result<Vec<String>, CatalogError> {
    let cells = grid.get(row as usize).ok_or_else(|| {
        CatalogError::Config(format!("Sheet {} has no header row at index {}", sheet, row))
    })?;

    let mut header: Vec<String> = cells.iter().map(CellValue::as_raw_string).collect();
    while header.last().is_some_and(|h| h.trim().is_empty()) {
        header.pop();
    }

    if header.is_empty() {
        return Err(CatalogError::Config(format!(
            "Header row {} of sheet {} is empty",
            row, sheet
        )));
    }
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_cell() {
        assert_eq!(convert_cell(&Data::Int(3)), CellValue::Number(3.0));
        assert_eq!(convert_cell(&Data::Float(1.5)), CellValue::Number(1.5));
        assert_eq!(
            convert_cell(&Data::String("HBG1".to_string())),
            CellValue::text("HBG1")
        );
        assert_eq!(convert_cell(&Data::Empty), CellValue::Empty);
    }

    #[test]
    fn test_to_grid_pads_to_absolute_position() {
        let mut range: Range<Data> = Range::new((1, 2), (2, 3));
        range.set_value((1, 2), Data::String("A".to_string()));
        range.set_value((2, 3), Data::Int(7));

        let grid = to_grid(&range);
        assert_eq!(grid.len(), 3);
        assert!(grid[0].is_empty());
        assert_eq!(grid[1][2], CellValue::text("A"));
        assert_eq!(grid[2][3], CellValue::Number(7.0));
        assert_eq!(grid[2][0], CellValue::Empty);
    }

    #[test]
    fn test_header_row_trims_trailing_empty_columns() {
        let grid = vec![vec![
            CellValue::text("SKU"),
            CellValue::Empty,
            CellValue::text("Quantity"),
            CellValue::Empty,
            CellValue::text("  "),
        ]];
        let header = header_row(&grid, 0, &SheetSelector::Index(0)).unwrap();
        assert_eq!(header, vec!["SKU", "", "Quantity"]);
    }

    #[test]
    fn test_header_row_missing() {
        let grid: Vec<Vec<CellValue>> = vec![vec![CellValue::text("SKU")]];
        assert!(matches!(
            header_row(&grid, 3, &SheetSelector::Name("Template".to_string())),
            Err(CatalogError::Config(_))
        ));
    }

    #[test]
    fn test_from_reader_rejects_oversized_input() {
        let data = vec![0u8; 64];
        let result = WorkbookReader::from_reader(Cursor::new(data), 16);
        assert!(matches!(result, Err(CatalogError::SecurityViolation(_))));
    }

    #[test]
    fn test_from_reader_rejects_garbage() {
        let data = b"not a workbook".to_vec();
        let result = WorkbookReader::from_reader(Cursor::new(data), 1024);
        assert!(result.is_err());
    }
}
