//! FILENAME: core/persistence/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XLSX write error: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("Workbook read error: {0}")]
    Read(#[from] calamine::Error),

    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Cell ({row}, {col}) is outside the worksheet")]
    OutOfBounds { row: usize, col: usize },

    #[error("File is empty or could not be processed")]
    EmptyUpload,

    #[error("Row {row} has {found} cells but the header has {expected}")]
    RowShape {
        row: usize,
        expected: usize,
        found: usize,
    },
}
