use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{ReconError, Result};
use crate::fmt::parse_amount;
use crate::models::{description_or, Transaction};

pub const DATE_COLUMN: &str = "Data";
pub const DESCRIPTION_COLUMN: &str = "Descrição";
pub const AMOUNT_COLUMN: &str = "Valor";

#[derive(Debug, Clone)]
pub struct SheetOptions {
    /// Worksheet to read; the first one when `None`. Ignored for CSV.
    pub sheet_name: Option<String>,
    pub placeholder: String,
}

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    fn from_text(raw: &str) -> Self {
        if raw.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(raw.to_string())
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.trim().to_string()),
            Cell::Number(f) => Some(f.to_string()),
        }
    }
}

#[cfg(feature = "xlsx")]
impl From<&calamine::Data> for Cell {
    fn from(data: &calamine::Data) -> Self {
        use calamine::Data;
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::from_text(s),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            Data::Bool(b) => Cell::Text(b.to_string()),
            Data::Error(e) => Cell::Text(format!("{e:?}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Largest serial Excel can display: 9999-12-31.
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..MAX_EXCEL_SERIAL + 1.0).contains(&serial) {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::Duration::try_days(serial.trunc() as i64)?)
}

pub fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    for fmt in ["%Y-%m-%d", "%d/%m/%Y", "%Y%m%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }
    // "2025-01-15 00:00:00" or "2025-01-15T00:00:00"
    match raw.get(10..11) {
        Some(" ") | Some("T") => NaiveDate::parse_from_str(&raw[..10], "%Y-%m-%d").ok(),
        _ => None,
    }
}

fn fold_header(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

fn cell_to_date(cell: &Cell, row: usize) -> Result<NaiveDate> {
    let parsed = match cell {
        Cell::Empty => None,
        Cell::Number(f) => excel_serial_to_date(*f),
        Cell::Text(s) => parse_date_text(s),
    };
    parsed.ok_or_else(|| {
        ReconError::Schema(format!(
            "row {row}: column '{DATE_COLUMN}' has invalid date {}",
            describe(cell)
        ))
    })
}

fn cell_to_amount(cell: &Cell, row: usize) -> Result<Decimal> {
    let parsed = match cell {
        Cell::Empty => None,
        Cell::Number(f) if f.is_finite() => Decimal::from_str(&f.to_string()).ok(),
        Cell::Number(_) => None,
        Cell::Text(s) => parse_amount(s),
    };
    parsed.ok_or_else(|| {
        ReconError::Schema(format!(
            "row {row}: column '{AMOUNT_COLUMN}' is not numeric: {}",
            describe(cell)
        ))
    })
}

fn describe(cell: &Cell) -> String {
    match cell {
        Cell::Empty => "(empty)".to_string(),
        Cell::Text(s) => format!("'{s}'"),
        Cell::Number(f) => f.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Row conversion
// ---------------------------------------------------------------------------

struct Columns {
    date: usize,
    description: usize,
    amount: usize,
}

fn locate_columns(header: &[Cell]) -> Result<Columns> {
    let names: Vec<String> = header
        .iter()
        .map(|c| c.as_text().map(|s| fold_header(&s)).unwrap_or_default())
        .collect();
    let find = |wanted: &str| {
        let folded = fold_header(wanted);
        names
            .iter()
            .position(|n| *n == folded)
            .ok_or_else(|| ReconError::Schema(format!("missing required column '{wanted}'")))
    };
    Ok(Columns {
        date: find(DATE_COLUMN)?,
        description: find(DESCRIPTION_COLUMN)?,
        amount: find(AMOUNT_COLUMN)?,
    })
}

/// Convert a header row plus data rows into transactions. Rows where every
/// cell is blank are not data rows; every other row must convert.
fn rows_to_transactions(rows: Vec<Vec<Cell>>, placeholder: &str) -> Result<Vec<Transaction>> {
    let mut iter = rows.into_iter();
    let header = iter
        .next()
        .ok_or_else(|| ReconError::Schema("spreadsheet has no header row".to_string()))?;
    let cols = locate_columns(&header)?;

    let mut out = Vec::new();
    for (i, row) in iter.enumerate() {
        if row.iter().all(Cell::is_empty) {
            continue;
        }
        // 1-based, header is row 1
        let row_no = i + 2;
        let get = |idx: usize| row.get(idx).cloned().unwrap_or(Cell::Empty);
        let date = cell_to_date(&get(cols.date), row_no)?;
        let amount = cell_to_amount(&get(cols.amount), row_no)?;
        let description = description_or(get(cols.description).as_text().as_deref(), placeholder);
        out.push(Transaction::new(date, description, amount));
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Formats: enum dispatch on file extension
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SheetFormat {
    Csv,
    #[cfg(feature = "xlsx")]
    Workbook,
}

impl SheetFormat {
    pub fn detect(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            #[cfg(feature = "xlsx")]
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(Self::Workbook),
            _ => Err(ReconError::UnsupportedFormat(format!(
                "{} (expected .csv{})",
                path.display(),
                if cfg!(feature = "xlsx") { ", .xlsx, .xls or .ods" } else { "" }
            ))),
        }
    }

    fn read_rows(&self, path: &Path, options: &SheetOptions) -> Result<Vec<Vec<Cell>>> {
        #[cfg(not(feature = "xlsx"))]
        let _ = options;
        match self {
            Self::Csv => read_csv_rows(path),
            #[cfg(feature = "xlsx")]
            Self::Workbook => read_workbook_rows(path, options.sheet_name.as_deref()),
        }
    }
}

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<Cell>>> {
    let text = crate::ofx::decode_text(&std::fs::read(path)?);
    let first_line = text.lines().next().unwrap_or("");
    let delimiter = if first_line.matches(';').count() > first_line.matches(',').count() {
        b';'
    } else {
        b','
    };
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }
    Ok(rows)
}

#[cfg(feature = "xlsx")]
fn read_workbook_rows(path: &Path, sheet_name: Option<&str>) -> Result<Vec<Vec<Cell>>> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| ReconError::Spreadsheet(format!("failed to open {}: {e}", path.display())))?;
    let name = match sheet_name {
        Some(n) => n.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ReconError::Spreadsheet("workbook has no worksheets".to_string()))?,
    };
    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| ReconError::Spreadsheet(format!("failed to read sheet '{name}': {e}")))?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(Cell::from).collect())
        .collect())
}

/// Read a spreadsheet with columns `Data`, `Descrição`, `Valor` into a
/// transaction table, one record per data row in file order.
pub fn parse(path: &Path, options: &SheetOptions) -> Result<Vec<Transaction>> {
    let format = SheetFormat::detect(path)?;
    let rows = format.read_rows(path, options)?;
    let table = rows_to_transactions(rows, &options.placeholder)?;
    tracing::debug!(
        path = %path.display(),
        format = ?format,
        rows = table.len(),
        "parsed spreadsheet"
    );
    Ok(table)
}
