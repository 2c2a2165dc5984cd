//! FILENAME: app/server/src/commands/utils.rs
// PURPOSE: Helper functions shared between different command modules.

use axum::http::header;
use axum::response::{IntoResponse, Response};
use engine::Record;
use persistence::{save_report_xlsx, PersistenceError};
use report_engine::ReportView;

use crate::error::ApiError;
use crate::{log_debug, AppState};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Snapshot of every stored record. The store lock is released on return.
pub(crate) fn load_records(state: &AppState) -> Result<Vec<Record>, ApiError> {
    state.with_store(|store| store.scan_all())
}

/// Writes the report to a temporary file and returns it as a download.
/// The temporary file is removed before the response is sent.
pub(crate) fn xlsx_attachment(view: &ReportView, file_name: &str) -> Result<Response, ApiError> {
    let file = tempfile::Builder::new()
        .prefix("groupsheet_")
        .suffix(".xlsx")
        .tempfile()
        .map_err(|e| ApiError::Export(PersistenceError::Io(e)))?;

    save_report_xlsx(view, file.path()).map_err(ApiError::Export)?;
    let bytes = std::fs::read(file.path()).map_err(|e| ApiError::Export(PersistenceError::Io(e)))?;

    log_debug!(
        "EXPORT",
        "{} rows={} bytes={}",
        file_name,
        view.data_row_count(),
        bytes.len()
    );

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response())
}
