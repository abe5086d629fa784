//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use std::path::PathBuf;
use thiserror::Error;

/// sheetbridgeクレート全体で使用するエラー型
///
/// ソースファイルの読み込み、列マッピングの検証、出力ファイルの書き込み中に
/// 発生するすべての致命的エラーを統一的に扱うために使用されます。
///
/// セル単位の変換エラーはこの型には現れません。変換関数は全域関数であり、
/// 解析できない値は空文字列として扱われます。
///
/// # エラーの種類
///
/// - `Io` / `FileAccess`: I/O操作中に発生したエラー
/// - `Parse`: ワークブックの解析中に発生したエラー（calamine由来）
/// - `Write`: xlsx出力の生成中に発生したエラー（rust_xlsxwriter由来）
/// - `MissingColumns`: マッピングが参照する列がソースのヘッダーに存在しない
/// - `Config`: 設定の検証に失敗したエラー
///
/// # 使用例
///
/// ```rust,no_run
/// use sheetbridge::CatalogError;
/// use std::fs::File;
///
/// fn open_source(path: &str) -> Result<(), CatalogError> {
///     let _file = File::open(path)?;  // Ioエラーが自動的に変換される
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum CatalogError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// パス付きのI/Oエラー
    ///
    /// 読み込めないソース、書き込めない出力先など、対象ファイルを
    /// 特定できる場合に使用されます。
    #[error("Cannot access '{}': {source}", .path.display())]
    FileAccess {
        /// 対象ファイルのパス
        path: PathBuf,
        /// 元のI/Oエラー
        #[source]
        source: std::io::Error,
    },

    /// ワークブックの解析中に発生したエラー
    ///
    /// `#[from]`属性により、`calamine::Error`から自動的に変換されます。
    #[error("Failed to parse workbook: {0}")]
    Parse(#[from] calamine::Error),

    /// xlsx出力の生成中に発生したエラー
    #[error("Failed to write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    /// JSONのシリアライズ/デシリアライズエラー
    ///
    /// 設定ファイルの読み込みやJSON出力で発生します。
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// マッピングが参照する列がテーブルのヘッダーに存在しない
    ///
    /// 検証は処理開始前に一度だけ行われ、欠落しているすべての列を
    /// まとめて報告します（最初の1列だけではありません）。
    ///
    /// # 例
    ///
    /// ```rust
    /// use sheetbridge::CatalogError;
    ///
    /// let error = CatalogError::MissingColumns {
    ///     table: "source".to_string(),
    ///     columns: vec!["SKU".to_string(), "Option Image".to_string()],
    /// };
    /// assert_eq!(
    ///     error.to_string(),
    ///     "Missing columns in source: 'SKU', 'Option Image'"
    /// );
    /// ```
    #[error("Missing columns in {table}: {}", quote_list(.columns))]
    MissingColumns {
        /// 検証対象のテーブル名（例: "source"）
        table: String,
        /// 欠落している列名（宣言順）
        columns: Vec<String>,
    },

    /// 設定の検証に失敗したエラー
    ///
    /// `PipelineBuilder::build()`や`Config::validate()`で無効な設定が
    /// 検出された場合に発生します。例えば、キャッチオール以外の
    /// パーティションが最後に宣言されている場合などです。
    #[error("Configuration error: {0}")]
    Config(String),

    /// 入力サイズ制限に違反したエラー
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}

impl CatalogError {
    /// パス付きのI/Oエラーを生成する
    pub(crate) fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CatalogError::FileAccess {
            path: path.into(),
            source,
        }
    }
}

fn quote_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| format!("'{}'", c))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: CatalogError = io_err.into();

        match error {
            CatalogError::Io(e) => {
                assert_eq!(e.kind(), io::ErrorKind::NotFound);
            }
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_file_access_display_includes_path() {
        let error = CatalogError::file_access(
            "output/temu_template_other_1.xlsx",
            io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied"),
        );
        let msg = error.to_string();
        assert!(msg.contains("output/temu_template_other_1.xlsx"));
        assert!(msg.contains("Permission denied"));
    }

    #[test]
    fn test_parse_error_display() {
        let error: CatalogError = calamine::Error::Msg("Corrupted file").into();
        let msg = error.to_string();
        assert!(msg.starts_with("Failed to parse workbook"));
        assert!(msg.contains("Corrupted file"));
    }

    // 欠落列はすべて列挙される
    #[test]
    fn test_missing_columns_lists_every_column() {
        let error = CatalogError::MissingColumns {
            table: "source".to_string(),
            columns: vec![
                "Made In Country".to_string(),
                "Item Weight".to_string(),
                "Option Image".to_string(),
            ],
        };
        let msg = error.to_string();
        assert!(msg.contains("'Made In Country'"));
        assert!(msg.contains("'Item Weight'"));
        assert!(msg.contains("'Option Image'"));
    }

    #[test]
    fn test_config_error_display() {
        let error = CatalogError::Config("catch-all partition must be last".to_string());
        assert!(error.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn test_error_conversion_with_question_mark() {
        fn io_operation() -> Result<(), CatalogError> {
            let _file = std::fs::File::open("nonexistent_products.xlsx")?;
            Ok(())
        }

        match io_operation() {
            Err(CatalogError::Io(_)) => {}
            _ => panic!("Expected Io error from ? operator"),
        }
    }

    #[test]
    fn test_json_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{ not json").unwrap_err();
        let error: CatalogError = parse_err.into();
        assert!(error.to_string().starts_with("JSON error"));
    }
}
