use crate::cell::CellValue;
use crate::error::LoadError;
use crate::spreadsheet::Sheet;
use log::{debug, info};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Somewhere sheets can be read from by name
///
/// Every call reads the backing store afresh; callers that want to avoid
/// repeated full-sheet scans go through [`crate::store::DataStore`], which
/// caches the parsed result.
pub trait WorkbookSource: Send + Sync {
    /// Read one sheet. `Ok(None)` means the workbook has no sheet of that name.
    fn read_sheet(&self, name: &str) -> Result<Option<Sheet>, LoadError>;
}

/// A directory holding one `<sheet name>.csv` per sheet
#[derive(Debug, Clone)]
pub struct CsvDirSource {
    dir: PathBuf,
}

impl CsvDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CsvDirSource { dir: dir.into() }
    }

    fn sheet_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", name))
    }
}

impl WorkbookSource for CsvDirSource {
    fn read_sheet(&self, name: &str) -> Result<Option<Sheet>, LoadError> {
        let path = self.sheet_path(name);
        if !path.is_file() {
            debug!("No CSV for sheet {} at {}", name, path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let records = parse_csv(&content).map_err(|(line, reason)| LoadError::Csv {
            path: path.display().to_string(),
            line,
            reason,
        })?;

        let rows = records
            .iter()
            .map(|record| record.iter().map(|s| CellValue::from_raw(s)).collect())
            .collect::<Vec<Vec<CellValue>>>();

        info!("Read sheet {} ({} rows) from {}", name, rows.len(), path.display());
        Ok(Some(Sheet::new(name, rows)))
    }
}

/// An Excel workbook on disk
#[derive(Debug, Clone)]
pub struct XlsxSource {
    path: PathBuf,
}

impl XlsxSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        XlsxSource { path: path.into() }
    }
}

impl WorkbookSource for XlsxSource {
    fn read_sheet(&self, name: &str) -> Result<Option<Sheet>, LoadError> {
        use calamine::{Data, Reader, Xlsx, open_workbook};

        let mut workbook: Xlsx<_> = open_workbook(&self.path)
            .map_err(|e: calamine::XlsxError| LoadError::Workbook(e.to_string()))?;

        if !workbook.sheet_names().iter().any(|s| s == name) {
            debug!("Workbook {} has no sheet {}", self.path.display(), name);
            return Ok(None);
        }

        let range = workbook
            .worksheet_range(name)
            .map_err(|e| LoadError::Workbook(e.to_string()))?;

        // The range starts at the first used cell, not at A1
        let (top, left) = range.start().map_or((0, 0), |(r, c)| (r as usize, c as usize));

        let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); top];
        rows.extend(range.rows().map(|row| {
            std::iter::repeat_n(CellValue::Empty, left)
                .chain(row.iter().map(|cell| match cell {
                    Data::Empty => CellValue::Empty,
                    Data::String(s) => CellValue::from(s.as_str()),
                    Data::Float(f) => CellValue::Number(*f),
                    Data::Int(i) => CellValue::Number(*i as f64),
                    Data::Bool(b) => CellValue::Bool(*b),
                    Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
                    Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from(s.as_str()),
                    _ => CellValue::Empty,
                }))
                .collect()
        }));

        info!("Read sheet {} ({} rows) from {}", name, rows.len(), self.path.display());
        Ok(Some(Sheet::new(name, rows)))
    }
}

/// Sheets held in memory, mostly for tests and tooling
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    sheets: HashMap<String, Sheet>,
}

impl MemorySource {
    pub fn new() -> Self {
        MemorySource::default()
    }

    pub fn with_sheet(mut self, sheet: Sheet) -> Self {
        self.insert(sheet);
        self
    }

    pub fn insert(&mut self, sheet: Sheet) {
        self.sheets.insert(sheet.name.clone(), sheet);
    }
}

impl WorkbookSource for MemorySource {
    fn read_sheet(&self, name: &str) -> Result<Option<Sheet>, LoadError> {
        Ok(self.sheets.get(name).cloned())
    }
}

/// Pick a source based on what lives at `path`
///
/// A directory is read as one CSV per sheet; `.xlsx` and `.xlsm` files are read
/// with calamine.
///
/// # Examples
/// ```no_run
/// use libretto::loader::open_source;
///
/// let source = open_source("data").expect("data directory");
/// let sheet = source.read_sheet("RS").expect("readable");
/// ```
pub fn open_source(path: impl AsRef<Path>) -> Result<Box<dyn WorkbookSource>, LoadError> {
    let path = path.as_ref();
    if path.is_dir() {
        return Ok(Box::new(CsvDirSource::new(path)));
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension.as_deref() {
        Some("xlsx") | Some("xlsm") if path.is_file() => Ok(Box::new(XlsxSource::new(path))),
        _ => Err(LoadError::Unsupported(path.display().to_string())),
    }
}

/// Split CSV text into records
///
/// Quoted fields may contain commas, doubled quotes and line breaks. A leading
/// UTF-8 BOM is skipped. Errors carry the 1-based line where the problem
/// started.
pub fn parse_csv(content: &str) -> Result<Vec<Vec<String>>, (usize, String)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut quote_line = 1;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => {
                in_quotes = true;
                quote_line = line;
            }
            ',' if !in_quotes => {
                record.push(std::mem::take(&mut field));
            }
            '\r' if !in_quotes => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                line += 1;
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            '\n' if !in_quotes => {
                line += 1;
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => {
                if c == '\n' {
                    line += 1;
                }
                field.push(c);
            }
        }
    }

    if in_quotes {
        return Err((quote_line, "unterminated quoted field".to_string()));
    }

    // No trailing newline
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    Ok(records)
}
