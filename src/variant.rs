//! Update Variant Module
//!
//! 出力テーブルから再登録用の「更新」テーブルを生成するモジュール。
//! 行は元のテーブルと同じで、在庫・価格列を空にし、ステータスを`Add`から`Update`に変更します。

use std::path::{Path, PathBuf};

use crate::config::UpdateVariantConfig;
use crate::types::{CellValue, OutputTable};

/// 更新用テーブルを生成する
///
/// 設定された列が出力に存在しない場合は何もしません。
/// ステータス列は値が`status_from`と一致する場合のみ置換されます。
pub fn derive(table: &OutputTable, config: &UpdateVariantConfig) -> OutputTable {
    let blank: Vec<usize> = column_indices(table, &config.blank_columns);
    let status: Vec<usize> = column_indices(table, std::slice::from_ref(&config.status_column));

    let rows = table
        .rows
        .iter()
        .map(|row| {
            let mut row = row.clone();
            for index in &blank {
                row[*index] = CellValue::Empty;
            }
            for index in &status {
                if row[*index].as_raw_string() == config.status_from {
                    row[*index] = CellValue::text(config.status_to.as_str());
                }
            }
            row
        })
        .collect();

    OutputTable {
        name: format!("{}{}", table.name, config.suffix),
        header: table.header.clone(),
        rows,
    }
}

/// 更新用ファイルのパス（`out/name.xlsx` → `out/name_update.xlsx`）
pub fn update_path(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };
    path.with_file_name(file_name)
}

fn column_indices(table: &OutputTable, names: &[String]) -> Vec<usize> {
    table
        .header
        .iter()
        .enumerate()
        .filter(|(_, h)| names.iter().any(|n| n == *h))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> OutputTable {
        let header = ["Quantity", "Base Price - USD", "Update or Add", "SKU", "Quantity"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut table = OutputTable::new("handbags", header);
        table.rows.push(vec![
            CellValue::Number(3.0),
            CellValue::Number(18.99),
            CellValue::text("Add"),
            CellValue::text("HBG1"),
            CellValue::Number(3.0),
        ]);
        table.rows.push(vec![
            CellValue::Number(1.0),
            CellValue::Number(9.99),
            CellValue::text("Keep"),
            CellValue::text("HBG2"),
            CellValue::Number(1.0),
        ]);
        table
    }

    #[test]
    fn test_derive_blanks_and_flips_status() {
        let update = derive(&table(), &UpdateVariantConfig::default());
        assert_eq!(update.name, "handbags_update");
        assert_eq!(update.len(), 2);

        let row = &update.rows[0];
        assert_eq!(row[0], CellValue::Empty);
        assert_eq!(row[1], CellValue::Empty);
        assert_eq!(row[2], CellValue::text("Update"));
        assert_eq!(row[3], CellValue::text("HBG1"));
        assert_eq!(row[4], CellValue::Empty);

        // "Add"以外のステータスは変更しない
        assert_eq!(update.rows[1][2], CellValue::text("Keep"));
    }

    #[test]
    fn test_derive_leaves_source_untouched() {
        let source = table();
        let _ = derive(&source, &UpdateVariantConfig::default());
        assert_eq!(source.rows[0][0], CellValue::Number(3.0));
    }

    #[test]
    fn test_update_path() {
        assert_eq!(
            update_path(Path::new("output/temu_template_other.xlsx"), "_update"),
            PathBuf::from("output/temu_template_other_update.xlsx")
        );
        assert_eq!(
            update_path(Path::new("plain"), "_update"),
            PathBuf::from("plain_update")
        );
    }
}
