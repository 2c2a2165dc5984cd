//! FILENAME: core/persistence/src/upload_reader.rs
//! PURPOSE: Reads an uploaded spreadsheet or CSV file into records.
//! CONTEXT: The first row is the header; each following row becomes one
//! record keyed by header names. Workbooks go through calamine (first
//! worksheet only), CSV through the csv crate.

use std::io::Cursor;

use calamine::{Data, Ods, Range, Reader, Xls, Xlsx};
use engine::{FieldValue, Record};
use serde::{Deserialize, Serialize};

use crate::PersistenceError;

/// Data rows kept from one upload unless configured otherwise.
pub const DEFAULT_MAX_ROWS: usize = 1000;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// ============================================================================
// UPLOAD FORMAT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadFormat {
    Xlsx,
    Xls,
    Ods,
    Csv,
}

impl UploadFormat {
    /// Detects the format from a file name's extension (case-insensitive).
    pub fn from_file_name(name: &str) -> Result<Self, PersistenceError> {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "xlsx" | "xlsm" => Ok(UploadFormat::Xlsx),
            "xls" => Ok(UploadFormat::Xls),
            "ods" => Ok(UploadFormat::Ods),
            "csv" => Ok(UploadFormat::Csv),
            _ => Err(PersistenceError::UnsupportedFormat(name.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            UploadFormat::Xlsx => "xlsx",
            UploadFormat::Xls => "xls",
            UploadFormat::Ods => "ods",
            UploadFormat::Csv => "csv",
        }
    }
}

// ============================================================================
// UPLOADED TABLE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedTable {
    pub headers: Vec<String>,
    pub records: Vec<Record>,

    /// Total data rows in the file when more than the cap were present.
    pub truncated_from: Option<usize>,
}

/// Parses `bytes` as `format`, keeping at most `max_rows` data rows.
pub fn read_upload(
    bytes: &[u8],
    format: UploadFormat,
    max_rows: usize,
) -> Result<UploadedTable, PersistenceError> {
    let rows = match format {
        UploadFormat::Xlsx => workbook_rows(first_sheet::<Xlsx<_>>(bytes)?),
        UploadFormat::Xls => workbook_rows(first_sheet::<Xls<_>>(bytes)?),
        UploadFormat::Ods => workbook_rows(first_sheet::<Ods<_>>(bytes)?),
        UploadFormat::Csv => csv_rows(bytes)?,
    };

    let table = assemble(rows, max_rows)?;

    log::info!(
        target: "UPLOAD",
        "read {} upload: headers={:?} rows={}",
        format.extension(),
        table.headers,
        table.records.len()
    );
    if let Some(total) = table.truncated_from {
        log::warn!(
            target: "UPLOAD",
            "upload truncated from {} to {} data rows",
            total,
            table.records.len()
        );
    }

    Ok(table)
}

// ============================================================================
// WORKBOOKS
// ============================================================================

fn first_sheet<'a, R>(bytes: &'a [u8]) -> Result<Range<Data>, PersistenceError>
where
    R: Reader<Cursor<&'a [u8]>>,
    calamine::Error: From<R::Error>,
{
    let mut workbook = R::new(Cursor::new(bytes)).map_err(calamine::Error::from)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(PersistenceError::EmptyUpload)?
        .map_err(calamine::Error::from)?;
    Ok(range)
}

fn workbook_rows(range: Range<Data>) -> Vec<Vec<FieldValue>> {
    range
        .rows()
        .map(|row| row.iter().map(convert_data).collect::<Vec<_>>())
        .filter(|row| !row.iter().all(FieldValue::is_null))
        .collect()
}

fn convert_data(cell: &Data) -> FieldValue {
    match cell {
        Data::Empty => FieldValue::Null,
        Data::String(s) => FieldValue::text(s.as_str()),
        Data::Float(f) => FieldValue::Number(*f),
        Data::Int(i) => FieldValue::Number(*i as f64),
        Data::Bool(b) => FieldValue::Boolean(*b),
        Data::Error(e) => FieldValue::text(e.to_string()),
        Data::DateTime(dt) => FieldValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) => FieldValue::text(s.as_str()),
        Data::DurationIso(s) => FieldValue::text(s.as_str()),
    }
}

// ============================================================================
// CSV
// ============================================================================

fn csv_rows(bytes: &[u8]) -> Result<Vec<Vec<FieldValue>>, PersistenceError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: Vec<FieldValue> = record.iter().map(infer_csv_value).collect();
        if !row.iter().all(FieldValue::is_null) {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Empty cells become null and plain numbers become numbers. Values with
/// a leading zero (zip codes, ids) stay text.
fn infer_csv_value(raw: &str) -> FieldValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return FieldValue::Null;
    }

    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let leading_zero = digits.len() > 1 && digits.starts_with('0') && !digits.starts_with("0.");
    let numeric_chars = digits
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));

    if !leading_zero && numeric_chars {
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return FieldValue::Number(n);
            }
        }
    }
    FieldValue::text(raw)
}

// ============================================================================
// ASSEMBLY
// ============================================================================

fn assemble(rows: Vec<Vec<FieldValue>>, max_rows: usize) -> Result<UploadedTable, PersistenceError> {
    let mut rows = rows.into_iter();
    let header_cells = rows.next().ok_or(PersistenceError::EmptyUpload)?;

    let headers: Vec<String> = header_cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            cell.display_value()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format!("column_{}", i + 1))
        })
        .collect();

    let data: Vec<Vec<FieldValue>> = rows.collect();
    let total = data.len();

    let mut records = Vec::with_capacity(total.min(max_rows));
    for (index, cells) in data.into_iter().take(max_rows).enumerate() {
        if cells.len() != headers.len() {
            // 1-based file row; the header is row 1.
            let row = index + 2;
            let values: Vec<String> = cells
                .iter()
                .map(|c| c.display_value().unwrap_or_default())
                .collect();
            log::error!(
                target: "UPLOAD",
                "row {} has {} cells, header has {}: headers={:?} row={:?}",
                row,
                cells.len(),
                headers.len(),
                headers,
                values
            );
            return Err(PersistenceError::RowShape {
                row,
                expected: headers.len(),
                found: cells.len(),
            });
        }
        records.push(headers.iter().cloned().zip(cells).collect::<Record>());
    }

    Ok(UploadedTable {
        headers,
        records,
        truncated_from: (total > max_rows).then_some(total),
    })
}
