//! Stock Filter Module
//!
//! 在庫数が正でない行を除外するモジュール。

use serde::Serialize;

use crate::types::{CellValue, SourceRow};

/// 在庫フィルタの集計結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StockCounts {
    /// 入力行数
    pub total: usize,

    /// 残った行数
    pub kept: usize,

    /// 除外された行数
    pub excluded: usize,
}

/// 在庫数が正の数として解釈できるかどうか
///
/// 数値として解釈できない値や空セルは在庫0として扱います。
pub fn in_stock(quantity: &CellValue) -> bool {
    quantity.as_number().is_some_and(|n| n > 0.0)
}

/// 在庫のある行だけを残す
///
/// # 引数
///
/// * `rows` - 入力行（順序は保持される）
/// * `column` - 在庫数の列インデックス
///
/// # 戻り値
///
/// 残った行と集計結果
pub fn filter(rows: Vec<SourceRow>, column: usize) -> (Vec<SourceRow>, StockCounts) {
    let total = rows.len();
    let kept: Vec<SourceRow> = rows
        .into_iter()
        .filter(|row| in_stock(row.get(column)))
        .collect();

    let counts = StockCounts {
        total,
        kept: kept.len(),
        excluded: total - kept.len(),
    };
    (kept, counts)
}

/// フィルタを適用しない場合の集計結果
pub fn bypass(rows: &[SourceRow]) -> StockCounts {
    StockCounts {
        total: rows.len(),
        kept: rows.len(),
        excluded: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(values: Vec<CellValue>) -> Vec<SourceRow> {
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| SourceRow::new(i as u32, vec![CellValue::text(format!("SKU{}", i)), v]))
            .collect()
    }

    #[test]
    fn test_filter_counts() {
        let input = rows(vec![
            CellValue::Number(5.0),
            CellValue::Number(0.0),
            CellValue::Number(-1.0),
            CellValue::text(""),
            CellValue::Number(3.0),
        ]);
        let (kept, counts) = filter(input, 1);
        assert_eq!(
            counts,
            StockCounts {
                total: 5,
                kept: 2,
                excluded: 3
            }
        );
        assert_eq!(kept[0].line, 0);
        assert_eq!(kept[1].line, 4);
    }

    #[test]
    fn test_non_numeric_quantity_is_excluded() {
        assert!(!in_stock(&CellValue::text("n/a")));
        assert!(!in_stock(&CellValue::Empty));
        assert!(!in_stock(&CellValue::Bool(true)));
        assert!(in_stock(&CellValue::text(" 2 ")));
        assert!(in_stock(&CellValue::Number(0.5)));
    }

    #[test]
    fn test_missing_column_is_treated_as_zero() {
        let (kept, counts) = filter(rows(vec![CellValue::Number(5.0)]), 7);
        assert!(kept.is_empty());
        assert_eq!(counts.excluded, 1);
    }

    #[test]
    fn test_bypass_keeps_everything() {
        let input = rows(vec![CellValue::Number(0.0), CellValue::Empty]);
        let counts = bypass(&input);
        assert_eq!(counts.total, 2);
        assert_eq!(counts.kept, 2);
        assert_eq!(counts.excluded, 0);
    }
}
