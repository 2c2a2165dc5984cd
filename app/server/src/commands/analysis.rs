//! FILENAME: app/server/src/commands/analysis.rs
// PURPOSE: Multi-column group/aggregate analysis and its spreadsheet export.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};
use group_engine::{aggregate, AggregationOutcome, AggregationQuery};
use report_engine::{build_report_view, shape, ReportDefinition};

use crate::api_types::{
    AnalysisSummary, AnalyzeRequest, AnalyzeResponse, ExportAnalysisRequest, FlatRow,
};
use crate::commands::utils::{load_records, xlsx_attachment};
use crate::error::ApiError;
use crate::{log_enter_info, log_exit_info, AppState};

pub const ANALYSIS_FILE_NAME: &str = "analysis_results.xlsx";

/// Validates the request and aggregates over a snapshot of the store.
fn run_query(state: &AppState, request: &AnalyzeRequest) -> Result<(AggregationQuery, AggregationOutcome), ApiError> {
    let query = request.to_query()?;
    let records = load_records(state)?;
    let outcome = aggregate(&records, &query)?;
    Ok((query, outcome))
}

/// Groups by one or more columns and aggregates one column per group.
///
/// POST /analyze
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    log_enter_info!(
        "ANALYZE",
        "analyze",
        "group_by={:?} {}({}) operator={:?} threshold={:?}",
        request.group_by,
        request.aggregate_function,
        request.aggregate_column,
        request.operator,
        request.threshold
    );

    let (query, outcome) = run_query(&state, &request)?;
    let groups = shape(&outcome.rows, &query.group_by, query.function);

    let response = AnalyzeResponse {
        success: true,
        data: outcome
            .rows
            .iter()
            .map(|row| FlatRow { group_by: &query.group_by, row })
            .collect(),
        summary: AnalysisSummary {
            total_groups: outcome.rows.len(),
            group_by: query.group_by.clone(),
            aggregate_column: query.aggregate_column.clone(),
            aggregate_function: query.function,
            missing_columns: outcome.missing_columns.clone(),
        },
        groups,
    };

    log_exit_info!(
        "ANALYZE",
        "analyze",
        "groups={} scanned={}",
        outcome.rows.len(),
        outcome.records_scanned
    );
    Ok(Json(response).into_response())
}

/// Same analysis, rendered as a styled workbook with custom headers.
///
/// POST /export-analysis
pub async fn export_analysis(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ExportAnalysisRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    log_enter_info!(
        "EXPORT",
        "export_analysis",
        "group_by={:?} {}({})",
        request.analysis.group_by,
        request.analysis.aggregate_function,
        request.analysis.aggregate_column
    );

    let (query, outcome) = run_query(&state, &request.analysis)?;
    let definition = ReportDefinition::from_query(&query)
        .with_labels(request.custom_headers.unwrap_or_default());
    let view = build_report_view(&outcome.rows, &definition);

    let response = xlsx_attachment(&view, ANALYSIS_FILE_NAME)?;
    log_exit_info!("EXPORT", "export_analysis", "rows={}", view.data_row_count());
    Ok(response)
}
