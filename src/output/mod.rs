//! Output Module
//!
//! Strategy Patternによる出力フォーマットの抽象化と、
//! チャンク分割・ファイル書き込みを提供するモジュール。
//!
//! 書き込みは2段階で行います。すべてのファイルをメモリ上で生成してから、
//! 一時ファイルに書き込み、最後にすべてを目的のパスへリネームします。

mod writers;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::api::OutputFormat;
use crate::error::CatalogError;
use crate::types::{OutputTable, Template};

pub use writers::*;

/// 出力ライター（Strategy Pattern）
///
/// 各出力フォーマット（xlsx, CSV, JSON）をenumとして表現します。
#[derive(Debug, Clone, Copy)]
pub enum OutputWriter {
    Xlsx,
    Csv,
    Json,
}

impl OutputWriter {
    /// 出力フォーマットからライターを生成
    pub fn from_format(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Xlsx => OutputWriter::Xlsx,
            OutputFormat::Csv => OutputWriter::Csv,
            OutputFormat::Json => OutputWriter::Json,
        }
    }

    /// テーブルの一部の行を指定されたフォーマットでバイト列に変換する
    ///
    /// # 引数
    ///
    /// * `template` - テンプレート（xlsx形式では定型行を再出力する）
    /// * `sheet_name` - xlsx形式のシート名
    /// * `table` - 出力テーブル
    /// * `range` - 出力する行の範囲
    pub fn render(
        &self,
        template: &Template,
        sheet_name: &str,
        table: &OutputTable,
        range: std::ops::Range<usize>,
    ) -> Result<Vec<u8>, CatalogError> {
        let rows = &table.rows[range];
        match self {
            OutputWriter::Xlsx => XlsxWriter.render(template, sheet_name, rows),
            OutputWriter::Csv => CsvWriter.render(&table.header, rows),
            OutputWriter::Json => JsonWriter.render(&table.name, &table.header, rows),
        }
    }
}

/// メモリ上で生成済みの出力ファイル
#[derive(Debug, Clone)]
pub struct RenderedFile {
    /// 書き込み先のパス
    pub path: PathBuf,

    /// ファイルの内容
    pub bytes: Vec<u8>,

    /// データ行数
    pub rows: usize,
}

/// パーティションの出力パスを決定する
///
/// 拡張子は出力フォーマットに合わせて置き換えます。
/// `dir`が指定された場合は、ファイル名だけを使用してそのディレクトリに配置します。
pub fn output_path(configured: &Path, dir: Option<&Path>, format: OutputFormat) -> PathBuf {
    let path = match (dir, configured.file_name()) {
        (Some(dir), Some(file_name)) => dir.join(file_name),
        _ => configured.to_path_buf(),
    };
    path.with_extension(format.extension())
}

/// チャンク番号付きのパス（`out/name.xlsx` → `out/name_1.xlsx`）
pub fn chunk_path(path: &Path, index: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}_{}", stem, index),
    };
    path.with_file_name(file_name)
}

/// テーブルをチャンクに分割してメモリ上で生成する
///
/// 空のテーブルはファイルを生成しません。
/// チャンク番号は1から始まり、テーブルが1チャンクに収まる場合も番号を付けます。
pub fn render_chunks(
    writer: OutputWriter,
    template: &Template,
    sheet_name: &str,
    table: &OutputTable,
    base_path: &Path,
    chunk_size: usize,
) -> Result<Vec<RenderedFile>, CatalogError> {
    if chunk_size == 0 {
        return Err(CatalogError::Config(
            "chunk_size must be greater than 0".to_string(),
        ));
    }

    let mut files = Vec::new();
    let mut start = 0;
    while start < table.len() {
        let end = (start + chunk_size).min(table.len());
        let path = chunk_path(base_path, files.len() + 1);
        let bytes = writer.render(template, sheet_name, table, start..end)?;
        debug!(path = %path.display(), rows = end - start, "rendered chunk");
        files.push(RenderedFile {
            path,
            bytes,
            rows: end - start,
        });
        start = end;
    }
    Ok(files)
}

/// 出力パスが重複していないことを確認する
///
/// 異なるパーティションが同じファイル名に解決される場合
/// （出力先ディレクトリの指定でディレクトリ部分が失われた場合など）を検出します。
///
/// # 戻り値
///
/// * `Err(CatalogError::Config)` - 同じパスに複数のファイルが割り当てられている場合
pub fn ensure_unique_paths(files: &[RenderedFile]) -> Result<(), CatalogError> {
    let mut seen: HashSet<&Path> = HashSet::with_capacity(files.len());
    for file in files {
        if !seen.insert(file.path.as_path()) {
            return Err(CatalogError::Config(format!(
                "Output path '{}' is produced more than once; give each partition a distinct output file name",
                file.path.display()
            )));
        }
    }
    Ok(())
}

/// 生成済みのファイルをすべて書き込む
///
/// まずすべてを一時ファイルに書き込み、成功した場合のみ目的のパスへリネームします。
/// 一時ファイルの書き込みに失敗した場合は、作成済みの一時ファイルを削除してエラーを返します。
/// 出力パスが重複している場合は何も書き込みません。
pub fn write_all(files: &[RenderedFile]) -> Result<(), CatalogError> {
    ensure_unique_paths(files)?;

    let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(files.len());

    for file in files {
        match stage(file) {
            Ok(temp) => staged.push((temp, file.path.as_path())),
            Err(e) => {
                discard(&staged);
                return Err(e);
            }
        }
    }

    for (index, (temp, path)) in staged.iter().enumerate() {
        if let Err(e) = fs::rename(temp, path) {
            discard(&staged[index..]);
            return Err(CatalogError::file_access(*path, e));
        }
    }
    Ok(())
}

fn stage(file: &RenderedFile) -> Result<PathBuf, CatalogError> {
    if let Some(parent) = file.path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| CatalogError::file_access(parent, e))?;
        }
    }

    let temp = temp_path(&file.path);
    fs::write(&temp, &file.bytes).map_err(|e| CatalogError::file_access(&temp, e))?;
    Ok(temp)
}

fn discard(staged: &[(PathBuf, &Path)]) {
    for (temp, _) in staged {
        if let Err(e) = fs::remove_file(temp) {
            warn!(path = %temp.display(), error = %e, "failed to remove temporary file");
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;

    fn table(rows: usize) -> OutputTable {
        let mut table = OutputTable::new("other", vec!["SKU".to_string()]);
        for i in 0..rows {
            table.rows.push(vec![CellValue::text(format!("X{}", i))]);
        }
        table
    }

    #[test]
    fn test_chunk_path() {
        assert_eq!(
            chunk_path(Path::new("output/temu_template_other.xlsx"), 2),
            PathBuf::from("output/temu_template_other_2.xlsx")
        );
        assert_eq!(chunk_path(Path::new("plain"), 1), PathBuf::from("plain_1"));
    }

    #[test]
    fn test_output_path() {
        let configured = Path::new("output/temu_template_other.xlsx");
        assert_eq!(
            output_path(configured, None, OutputFormat::Csv),
            PathBuf::from("output/temu_template_other.csv")
        );
        assert_eq!(
            output_path(configured, Some(Path::new("/tmp/run")), OutputFormat::Xlsx),
            PathBuf::from("/tmp/run/temu_template_other.xlsx")
        );
    }

    #[test]
    fn test_render_chunks_splits_rows() {
        let template = Template::from_header(vec!["SKU".to_string()]);
        let files = render_chunks(
            OutputWriter::Csv,
            &template,
            "Template",
            &table(5),
            Path::new("out/other.csv"),
            2,
        )
        .unwrap();

        assert_eq!(files.len(), 3);
        assert_eq!(files[0].path, PathBuf::from("out/other_1.csv"));
        assert_eq!(files[2].path, PathBuf::from("out/other_3.csv"));
        assert_eq!(files.iter().map(|f| f.rows).collect::<Vec<_>>(), vec![2, 2, 1]);

        let last = String::from_utf8(files[2].bytes.clone()).unwrap();
        assert_eq!(last, "SKU\nX4\n");
    }

    #[test]
    fn test_render_chunks_empty_table_produces_nothing() {
        let template = Template::from_header(vec!["SKU".to_string()]);
        let files = render_chunks(
            OutputWriter::Json,
            &template,
            "Template",
            &table(0),
            Path::new("out/other.json"),
            1000,
        )
        .unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_write_all_creates_directories_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            RenderedFile {
                path: dir.path().join("nested/a_1.csv"),
                bytes: b"SKU\n".to_vec(),
                rows: 0,
            },
            RenderedFile {
                path: dir.path().join("nested/a_2.csv"),
                bytes: b"SKU\nX\n".to_vec(),
                rows: 1,
            },
        ];
        write_all(&files).unwrap();

        assert_eq!(fs::read(dir.path().join("nested/a_2.csv")).unwrap(), b"SKU\nX\n");
        let names: Vec<String> = fs::read_dir(dir.path().join("nested"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| !n.ends_with(".tmp")));
    }

    #[test]
    fn test_write_all_rejects_duplicate_paths_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out_1.csv");
        let files = vec![
            RenderedFile {
                path: path.clone(),
                bytes: b"A\n".to_vec(),
                rows: 1,
            },
            RenderedFile {
                path: path.clone(),
                bytes: b"B\n".to_vec(),
                rows: 1,
            },
        ];

        match write_all(&files) {
            Err(CatalogError::Config(msg)) => assert!(msg.contains("out_1.csv")),
            other => panic!("Expected Config error, got {:?}", other),
        }
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_write_all_failure_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        // 親パスがファイルのためディレクトリを作成できない
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();
        let files = vec![RenderedFile {
            path: blocker.join("out.csv"),
            bytes: Vec::new(),
            rows: 0,
        }];

        let err = write_all(&files).unwrap_err();
        assert!(matches!(err, CatalogError::FileAccess { .. }));
    }
}
