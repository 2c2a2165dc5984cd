//! FILENAME: app/server/src/commands/upload.rs
// PURPOSE: Parses an uploaded workbook or CSV file into records.
// CONTEXT: Nothing is stored here; the client reviews the rows and then
// submits them to /save.

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::response::Json;
use engine::Record;
use persistence::{read_upload, UploadFormat};

use crate::error::ApiError;
use crate::{log_enter_info, log_exit_info, log_warn, AppState};

const FILE_FIELD: &str = "file";

/// Reads the `file` field of a multipart form.
///
/// POST /upload
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Vec<Record>>, ApiError> {
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let format = UploadFormat::from_file_name(&file_name).map_err(ApiError::Upload)?;
        let bytes = field.bytes().await?;

        log_enter_info!(
            "UPLOAD",
            "upload_file",
            "name={} format={} size={}",
            file_name,
            format.extension(),
            bytes.len()
        );

        let table = read_upload(&bytes, format, state.config.max_upload_rows).map_err(|e| {
            log_warn!("UPLOAD", "failed to read {}: {}", file_name, e);
            ApiError::Upload(e)
        })?;

        log_exit_info!(
            "UPLOAD",
            "upload_file",
            "headers={:?} rows={}",
            table.headers,
            table.records.len()
        );
        return Ok(Json(table.records));
    }

    Err(ApiError::Validation(format!(
        "The {} field is required",
        FILE_FIELD
    )))
}
