//! FILENAME: app/server/src/commands/rows.rs
// PURPOSE: Replacing, clearing and inspecting the stored rows.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Json;
use engine::discover_headers;

use crate::api_types::{ClearRowsResponse, HeadersResponse, SaveRowsRequest, SaveRowsResponse};
use crate::error::ApiError;
use crate::{log_enter_info, log_exit_info, AppState};

/// Replaces the stored rows with the submitted batch.
///
/// POST /save
pub async fn save_rows(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SaveRowsRequest>, JsonRejection>,
) -> Result<Json<SaveRowsResponse>, ApiError> {
    let Json(request) = payload?;
    log_enter_info!("ROWS", "save_rows", "rows={}", request.rows.len());

    let stored = state.with_store(|store| store.replace_all(request.rows))?;

    log_exit_info!("ROWS", "save_rows", "stored={}", stored);
    Ok(Json(SaveRowsResponse { stored }))
}

/// Removes every stored row.
///
/// POST /clear
pub async fn clear_rows(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ClearRowsResponse>, ApiError> {
    let cleared = state.with_store(|store| store.clear())?;
    log_exit_info!("ROWS", "clear_rows", "cleared={}", cleared);
    Ok(Json(ClearRowsResponse { cleared }))
}

/// Field names of one stored record, in record order.
///
/// GET /headers
pub async fn get_headers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HeadersResponse>, ApiError> {
    let headers = state.with_store(|store| discover_headers(&*store))?;
    Ok(Json(HeadersResponse { headers }))
}
