//! FILENAME: app/server/src/commands/groups.rs
// PURPOSE: Legacy single-column grouping and its spreadsheet export.
// CONTEXT: Without agg_col the groups are only counted; with agg_col the
// column is summed and the threshold (default "> 0") is applied.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json, Response};
use group_engine::{aggregate, AggregateFunction, AggregationOutcome};
use report_engine::{build_report_view, HeaderLabels, ReportDefinition};

use crate::api_types::{GroupsQuery, LegacyGroupRow, COUNT_KEY};
use crate::commands::utils::{load_records, xlsx_attachment};
use crate::error::ApiError;
use crate::{log_enter_info, log_exit_info, AppState};

pub const GROUPS_FILE_NAME: &str = "grouped_data.xlsx";

fn run_groups(state: &AppState, params: &GroupsQuery) -> Result<AggregationOutcome, ApiError> {
    let query = params.to_query()?;
    let records = load_records(state)?;
    Ok(aggregate(&records, &query)?)
}

/// GET /groups
pub async fn get_groups(
    State(state): State<Arc<AppState>>,
    params: Result<Query<GroupsQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    log_enter_info!(
        "GROUPS",
        "get_groups",
        "group_by={} agg_col={:?} operator={:?} threshold={:?}",
        params.group_by,
        params.agg_col,
        params.operator,
        params.threshold
    );

    let outcome = run_groups(&state, &params)?;
    let sum_key = params.sum_key();
    let rows: Vec<LegacyGroupRow> = outcome
        .rows
        .iter()
        .map(|row| LegacyGroupRow { row, sum_key: sum_key.as_deref() })
        .collect();

    log_exit_info!("GROUPS", "get_groups", "groups={}", rows.len());
    Ok(Json(rows).into_response())
}

/// GET /export-groups
pub async fn export_groups(
    State(state): State<Arc<AppState>>,
    params: Result<Query<GroupsQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    log_enter_info!(
        "EXPORT",
        "export_groups",
        "group_by={} agg_col={:?}",
        params.group_by,
        params.agg_col
    );

    let outcome = run_groups(&state, &params)?;

    let mut labels = HeaderLabels::new();
    labels.insert(COUNT_KEY, COUNT_KEY);
    let definition = match (params.aggregate_column(), params.sum_key()) {
        (Some(column), Some(sum_key)) => {
            labels.insert(AggregateFunction::Sum.label_for(column), sum_key);
            ReportDefinition::new(vec![params.group_by.clone()], column, AggregateFunction::Sum)
        }
        _ => ReportDefinition::new(
            vec![params.group_by.clone()],
            params.group_by.clone(),
            AggregateFunction::Count,
        )
        .without_aggregate(),
    };
    let definition = definition.with_labels(labels).with_sheet_name("Grouped Data");

    let view = build_report_view(&outcome.rows, &definition);
    let response = xlsx_attachment(&view, GROUPS_FILE_NAME)?;

    log_exit_info!("EXPORT", "export_groups", "rows={}", view.data_row_count());
    Ok(response)
}
