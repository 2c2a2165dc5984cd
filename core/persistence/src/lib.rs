//! FILENAME: core/persistence/src/lib.rs
//! GroupSheet Persistence Module
//!
//! Spreadsheet file I/O at the edges of the system: reading uploaded
//! workbooks and CSV files into records, and writing styled report
//! workbooks.

mod error;
mod upload_reader;
mod xlsx_writer;

pub use error::PersistenceError;
pub use upload_reader::{read_upload, UploadFormat, UploadedTable, DEFAULT_MAX_ROWS};
pub use xlsx_writer::{export_report, save_report_xlsx, write_report_xlsx};
