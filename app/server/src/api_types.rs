//! FILENAME: app/server/src/api_types.rs
// PURPOSE: Request and response types of the HTTP API.
// CONTEXT: Analysis bodies use camelCase fields; the legacy /groups routes
// use snake_case query parameters.

use engine::Record;
use group_engine::{AggregateFunction, AggregationQuery, AggregationRow, Threshold};
use report_engine::{HeaderLabels, ReportTree};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ApiError;

/// Keys written by the server into every analysis data row.
pub const AGGREGATE_VALUE_KEY: &str = "aggregate_value";
pub const COUNT_KEY: &str = "count";

const DEFAULT_OPERATOR: &str = ">";

// ============================================================================
// ROWS
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SaveRowsRequest {
    pub rows: Vec<Record>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveRowsResponse {
    pub stored: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearRowsResponse {
    pub cleared: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadersResponse {
    pub headers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

// ============================================================================
// ANALYSIS
// ============================================================================

/// A threshold arrives either as a JSON number or as a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ThresholdInput {
    Number(f64),
    Text(String),
}

impl ThresholdInput {
    fn as_text(&self) -> String {
        match self {
            ThresholdInput::Number(n) => n.to_string(),
            ThresholdInput::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub group_by: Vec<String>,
    pub aggregate_column: String,
    pub aggregate_function: String,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub threshold: Option<ThresholdInput>,
}

impl AnalyzeRequest {
    /// Builds and validates the query. An operator without a threshold
    /// value applies no filter.
    pub fn to_query(&self) -> Result<AggregationQuery, ApiError> {
        let function: AggregateFunction = self.aggregate_function.parse()?;
        let mut query = AggregationQuery::new(
            self.group_by.clone(),
            self.aggregate_column.clone(),
            function,
        );

        if let Some(threshold) = &self.threshold {
            let operator = self.operator.as_deref().unwrap_or(DEFAULT_OPERATOR);
            query = query.with_threshold(Threshold::parse(operator, &threshold.as_text())?);
        }

        query.validate()?;
        Ok(query)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportAnalysisRequest {
    #[serde(flatten)]
    pub analysis: AnalyzeRequest,
    #[serde(default)]
    pub custom_headers: Option<HeaderLabels>,
}

/// One analysis result as a flat object: the group-by values, then
/// `aggregate_value` and `count`. A group-by column with one of those two
/// names is shadowed by the computed field.
pub struct FlatRow<'a> {
    pub group_by: &'a [String],
    pub row: &'a AggregationRow,
}

impl Serialize for FlatRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut written: Vec<&str> = Vec::with_capacity(self.group_by.len());
        let mut map = serializer.serialize_map(None)?;

        for (level, column) in self.group_by.iter().enumerate() {
            let column = column.as_str();
            if column == AGGREGATE_VALUE_KEY || column == COUNT_KEY || written.contains(&column) {
                continue;
            }
            map.serialize_entry(column, &self.row.key.component(level))?;
            written.push(column);
        }

        map.serialize_entry(AGGREGATE_VALUE_KEY, &self.row.aggregate_value)?;
        map.serialize_entry(COUNT_KEY, &self.row.count)?;
        map.end()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub total_groups: usize,
    pub group_by: Vec<String>,
    pub aggregate_column: String,
    pub aggregate_function: AggregateFunction,
    pub missing_columns: Vec<String>,
}

#[derive(Serialize)]
pub struct AnalyzeResponse<'a> {
    pub success: bool,
    pub data: Vec<FlatRow<'a>>,
    pub summary: AnalysisSummary,
    pub groups: ReportTree,
}

// ============================================================================
// LEGACY SINGLE-COLUMN GROUPS
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct GroupsQuery {
    pub group_by: String,
    #[serde(default)]
    pub agg_col: Option<String>,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub threshold: Option<String>,
}

impl GroupsQuery {
    /// The aggregate column, treating an empty value as absent.
    pub fn aggregate_column(&self) -> Option<&str> {
        self.agg_col.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    /// `sum` of `agg_col` with the threshold applied, or a plain count of
    /// the group column when no `agg_col` is given.
    pub fn to_query(&self) -> Result<AggregationQuery, ApiError> {
        let group_by = vec![self.group_by.clone()];

        let query = match self.aggregate_column() {
            Some(column) => {
                let operator = self.operator.as_deref().unwrap_or(DEFAULT_OPERATOR);
                let value = self.threshold.as_deref().unwrap_or("0");
                AggregationQuery::new(group_by, column, AggregateFunction::Sum)
                    .with_threshold(Threshold::parse(operator, value)?)
            }
            None => AggregationQuery::new(group_by, self.group_by.clone(), AggregateFunction::Count),
        };

        query.validate()?;
        Ok(query)
    }

    /// Name of the sum field, e.g. `sum_sales`.
    pub fn sum_key(&self) -> Option<String> {
        self.aggregate_column().map(|c| format!("sum_{}", c))
    }
}

/// `{group_value, count, sum_<agg_col>?}`
pub struct LegacyGroupRow<'a> {
    pub row: &'a AggregationRow,
    pub sum_key: Option<&'a str>,
}

impl Serialize for LegacyGroupRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("group_value", &self.row.key.component(0))?;
        map.serialize_entry(COUNT_KEY, &self.row.count)?;
        if let Some(key) = self.sum_key {
            map.serialize_entry(key, &self.row.aggregate_value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use group_engine::GroupingError;
    use serde_json::json;

    fn analyze(body: serde_json::Value) -> AnalyzeRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_analyze_request_to_query() {
        let request = analyze(json!({
            "groupBy": ["region"],
            "aggregateColumn": "sales",
            "aggregateFunction": "SUM",
            "operator": ">=",
            "threshold": "10"
        }));
        let query = request.to_query().unwrap();

        assert_eq!(query.function, AggregateFunction::Sum);
        let threshold = query.threshold.unwrap();
        assert_eq!(threshold.value, 10.0);
        assert_eq!(threshold.operator.symbol(), ">=");
    }

    #[test]
    fn test_numeric_threshold_defaults_operator() {
        let request = analyze(json!({
            "groupBy": ["region"],
            "aggregateColumn": "sales",
            "aggregateFunction": "avg",
            "threshold": 2.5
        }));
        let threshold = request.to_query().unwrap().threshold.unwrap();
        assert_eq!(threshold.operator.symbol(), ">");
        assert_eq!(threshold.value, 2.5);
    }

    #[test]
    fn test_invalid_function_is_rejected() {
        let request = analyze(json!({
            "groupBy": ["region"],
            "aggregateColumn": "sales",
            "aggregateFunction": "median"
        }));
        assert!(matches!(
            request.to_query(),
            Err(ApiError::Query(GroupingError::InvalidAggregateFunction(_)))
        ));
    }

    #[test]
    fn test_flat_row_shadowing() {
        let row = AggregationRow {
            key: [Some("A"), Some("x")].into_iter().collect(),
            aggregate_value: Some(3.0),
            count: 2,
        };
        let group_by = vec!["region".to_string(), "count".to_string()];
        let value = serde_json::to_value(FlatRow { group_by: &group_by, row: &row }).unwrap();

        assert_eq!(value, json!({"region": "A", "aggregate_value": 3.0, "count": 2}));
    }

    #[test]
    fn test_legacy_query_without_agg_col_counts() {
        let query = GroupsQuery {
            group_by: "city".into(),
            agg_col: Some("".into()),
            operator: None,
            threshold: Some("100".into()),
        };
        let built = query.to_query().unwrap();
        assert_eq!(built.function, AggregateFunction::Count);
        assert!(built.threshold.is_none());
        assert_eq!(query.sum_key(), None);
    }

    #[test]
    fn test_legacy_row_shape() {
        let row = AggregationRow {
            key: [None::<&str>].into_iter().collect(),
            aggregate_value: Some(12.0),
            count: 3,
        };
        let value = serde_json::to_value(LegacyGroupRow { row: &row, sum_key: Some("sum_sales") }).unwrap();
        assert_eq!(value, json!({"group_value": null, "count": 3, "sum_sales": 12.0}));
    }
}
