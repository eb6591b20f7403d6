//! Spreadsheet sources that provide raw expense rows.
//!
//! The online spreadsheet connector lives outside this crate; what it hands
//! over is an ordered list of [`Worksheet`]s. The file-backed sources here
//! read the same shape from JSON exports.

use std::path::{Path, PathBuf};

use expense_core::error::{ExpenseError, Result};
use expense_core::raw::RawRow;
use serde_json::Value;
use tracing::{debug, warn};

// ── Worksheet ─────────────────────────────────────────────────────────────────

/// One named sheet and its rows, in sheet order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Worksheet {
    pub title: String,
    pub rows: Vec<RawRow>,
}

impl Worksheet {
    pub fn new(title: impl Into<String>, rows: Vec<RawRow>) -> Self {
        Self {
            title: title.into(),
            rows,
        }
    }

    /// Build a sheet from a JSON array of row objects.
    ///
    /// Elements that are not objects are skipped.
    pub fn from_json_rows(title: impl Into<String>, rows: &[Value]) -> Self {
        let title = title.into();
        let parsed: Vec<RawRow> = rows.iter().filter_map(RawRow::from_json).collect();
        if parsed.len() != rows.len() {
            debug!(
                sheet = %title,
                skipped = rows.len() - parsed.len(),
                "non-object rows ignored"
            );
        }
        Self::new(title, parsed)
    }
}

// ── SpreadsheetSource ─────────────────────────────────────────────────────────

/// Provider of an ordered list of worksheets.
///
/// Any connection, authentication or decoding failure is reported as
/// [`ExpenseError::SourceUnavailable`].
pub trait SpreadsheetSource {
    fn worksheets(&self) -> Result<Vec<Worksheet>>;
}

impl<S: SpreadsheetSource + ?Sized> SpreadsheetSource for Box<S> {
    fn worksheets(&self) -> Result<Vec<Worksheet>> {
        (**self).worksheets()
    }
}

/// Open the file-backed source matching `path`: a directory of per-sheet
/// exports or a single workbook file.
pub fn open_source(path: &Path) -> Box<dyn SpreadsheetSource> {
    if path.is_dir() {
        Box::new(SheetDirectorySource::new(path))
    } else {
        Box::new(WorkbookFileSource::new(path))
    }
}

// ── InMemorySource ────────────────────────────────────────────────────────────

/// A fixed list of sheets.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    sheets: Vec<Worksheet>,
}

impl InMemorySource {
    pub fn new(sheets: Vec<Worksheet>) -> Self {
        Self { sheets }
    }
}

impl SpreadsheetSource for InMemorySource {
    fn worksheets(&self) -> Result<Vec<Worksheet>> {
        Ok(self.sheets.clone())
    }
}

// ── WorkbookFileSource ────────────────────────────────────────────────────────

/// A whole workbook exported to one JSON file.
///
/// Accepts either `{"sheets": [...]}` or a bare array of sheets, where each
/// sheet is `{"title": "...", "rows": [{...}, ...]}`.
#[derive(Debug, Clone)]
pub struct WorkbookFileSource {
    path: PathBuf,
}

impl WorkbookFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse_workbook(&self, doc: &Value) -> Result<Vec<Worksheet>> {
        let sheets = doc
            .get("sheets")
            .unwrap_or(doc)
            .as_array()
            .ok_or_else(|| {
                ExpenseError::unavailable(format!(
                    "{}: expected an array of sheets",
                    self.path.display()
                ))
            })?;

        sheets
            .iter()
            .enumerate()
            .map(|(i, sheet)| {
                let title = sheet
                    .get("title")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Sheet{}", i + 1));
                let rows = sheet.get("rows").and_then(Value::as_array).ok_or_else(|| {
                    ExpenseError::unavailable(format!(
                        "{}: sheet \"{}\" has no rows array",
                        self.path.display(),
                        title
                    ))
                })?;
                Ok(Worksheet::from_json_rows(title, rows))
            })
            .collect()
    }
}

impl SpreadsheetSource for WorkbookFileSource {
    fn worksheets(&self) -> Result<Vec<Worksheet>> {
        let doc = read_json(&self.path)?;
        let sheets = self.parse_workbook(&doc)?;
        debug!(
            path = %self.path.display(),
            sheets = sheets.len(),
            "workbook loaded"
        );
        Ok(sheets)
    }
}

// ── SheetDirectorySource ──────────────────────────────────────────────────────

/// A directory holding one `*.json` export per sheet.
///
/// Each file is an array of row objects; sheets are ordered by file name and
/// titled by file stem.
#[derive(Debug, Clone)]
pub struct SheetDirectorySource {
    dir: PathBuf,
}

impl SheetDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SpreadsheetSource for SheetDirectorySource {
    fn worksheets(&self) -> Result<Vec<Worksheet>> {
        if !self.dir.is_dir() {
            return Err(ExpenseError::unavailable(format!(
                "{} is not a directory",
                self.dir.display()
            )));
        }

        find_sheet_files(&self.dir)
            .iter()
            .map(|file| {
                let doc = read_json(file)?;
                let rows = doc.as_array().ok_or_else(|| {
                    ExpenseError::unavailable(format!(
                        "{}: expected an array of rows",
                        file.display()
                    ))
                })?;
                let title = file
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Ok(Worksheet::from_json_rows(title, rows))
            })
            .collect()
    }
}

/// All `.json` files directly under `dir`, sorted by path.
pub fn find_sheet_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        warn!("Sheet directory does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext == "json")
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ExpenseError::unavailable(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| ExpenseError::unavailable(format!("{}: {}", path.display(), e)))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use expense_core::raw::{Column, RawValue};
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, value: &Value) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
        path
    }

    // ── Worksheet ─────────────────────────────────────────────────────────────

    #[test]
    fn test_worksheet_skips_non_object_rows() {
        let rows = vec![json!({"Nome": "Taxi"}), json!("garbage"), json!(3)];
        let sheet = Worksheet::from_json_rows("Luglio", &rows);
        assert_eq!(sheet.title, "Luglio");
        assert_eq!(sheet.rows.len(), 1);
    }

    // ── WorkbookFileSource ────────────────────────────────────────────────────

    #[test]
    fn test_workbook_file_with_sheets_key() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            tmp.path(),
            "viaggio.json",
            &json!({"sheets": [
                {"title": "Istruzioni", "rows": []},
                {"title": "Perù", "rows": [{"Nome": "Bus", "Totale": 4}]},
            ]}),
        );

        let sheets = WorkbookFileSource::new(&path).worksheets().unwrap();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].title, "Istruzioni");
        assert_eq!(sheets[1].title, "Perù");
        assert_eq!(
            sheets[1].rows[0].get(Column::Total),
            Some(&RawValue::Number(4.0))
        );
    }

    #[test]
    fn test_workbook_file_bare_array_and_default_titles() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "wb.json", &json!([{"rows": []}, {"rows": []}]));

        let sheets = WorkbookFileSource::new(&path).worksheets().unwrap();
        assert_eq!(sheets[0].title, "Sheet1");
        assert_eq!(sheets[1].title, "Sheet2");
    }

    #[test]
    fn test_workbook_file_missing_is_unavailable() {
        let err = WorkbookFileSource::new("/no/such/workbook.json")
            .worksheets()
            .unwrap_err();
        assert!(matches!(err, ExpenseError::SourceUnavailable(_)));
    }

    #[test]
    fn test_workbook_file_malformed_json_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = WorkbookFileSource::new(&path).worksheets().unwrap_err();
        assert!(matches!(err, ExpenseError::SourceUnavailable(_)));
    }

    #[test]
    fn test_workbook_file_sheet_without_rows_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "wb.json", &json!([{"title": "Vuoto"}]));

        let err = WorkbookFileSource::new(&path).worksheets().unwrap_err();
        assert!(err.to_string().contains("Vuoto"));
    }

    // ── SheetDirectorySource ──────────────────────────────────────────────────

    #[test]
    fn test_directory_source_orders_by_file_name() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "02_peru.json", &json!([{"Nome": "Bus"}]));
        write(tmp.path(), "00_istruzioni.json", &json!([]));
        write(tmp.path(), "01_bolivia.json", &json!([{"Nome": "Taxi"}, {"Nome": "Treno"}]));
        std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let sheets = SheetDirectorySource::new(tmp.path()).worksheets().unwrap();
        let titles: Vec<&str> = sheets.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["00_istruzioni", "01_bolivia", "02_peru"]);
        assert_eq!(sheets[1].rows.len(), 2);
    }

    #[test]
    fn test_directory_source_ignores_nested_dirs() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("archive");
        std::fs::create_dir_all(&nested).unwrap();
        write(&nested, "old.json", &json!([]));
        write(tmp.path(), "a.json", &json!([]));

        assert_eq!(find_sheet_files(tmp.path()).len(), 1);
    }

    #[test]
    fn test_directory_source_missing_dir_is_unavailable() {
        let err = SheetDirectorySource::new("/tmp/does-not-exist-expense-test-xyz")
            .worksheets()
            .unwrap_err();
        assert!(matches!(err, ExpenseError::SourceUnavailable(_)));
    }

    #[test]
    fn test_directory_source_non_array_file_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.json", &json!({"Nome": "Bus"}));
        assert!(SheetDirectorySource::new(tmp.path()).worksheets().is_err());
    }

    // ── open_source ───────────────────────────────────────────────────────────

    #[test]
    fn test_open_source_picks_by_path_kind() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.json", &json!([]));
        let from_dir = open_source(tmp.path()).worksheets().unwrap();
        assert_eq!(from_dir.len(), 1);

        let file = write(tmp.path(), "wb.json", &json!({"sheets": []}));
        let from_file = open_source(&file).worksheets().unwrap();
        assert!(from_file.is_empty());
    }

    #[test]
    fn test_in_memory_source() {
        let source = InMemorySource::new(vec![Worksheet::new("A", vec![])]);
        assert_eq!(source.worksheets().unwrap().len(), 1);
    }
}
