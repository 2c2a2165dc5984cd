//! FILENAME: core/report-engine/src/definition.rs
//! Report Definition - The serializable report configuration.
//!
//! Describes how grouped results are labelled and laid out. Custom header
//! labels are session state owned by the caller and are passed in here,
//! never held globally.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use group_engine::{AggregateFunction, AggregationQuery};

/// Key under which a custom label for the count column is looked up.
pub const COUNT_LABEL_KEY: &str = "count";

/// Default header of the count column.
pub const DEFAULT_COUNT_LABEL: &str = "Count";

// ============================================================================
// HEADER LABELS
// ============================================================================

/// User overrides for header cells, keyed by column name, `count`, or the
/// aggregate label (e.g. `sum(sales)`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderLabels(HashMap<String, String>);

impl HeaderLabels {
    pub fn new() -> Self {
        HeaderLabels(HashMap::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, label: impl Into<String>) {
        self.0.insert(key.into(), label.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// The custom label for `key`, or `default` when none is set.
    pub fn label_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderLabels {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        HeaderLabels(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ============================================================================
// REPORT DEFINITION
// ============================================================================

/// Everything the export needs besides the result rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDefinition {
    pub group_by: Vec<String>,
    pub aggregate_column: String,
    pub function: AggregateFunction,
    pub header_labels: HeaderLabels,

    /// Whether the aggregate column is written. The plain count report
    /// (grouping without an aggregate column) leaves it out.
    pub show_aggregate: bool,

    /// Worksheet name for the export.
    pub sheet_name: String,
}

impl ReportDefinition {
    pub fn new(group_by: Vec<String>, aggregate_column: impl Into<String>, function: AggregateFunction) -> Self {
        ReportDefinition {
            group_by,
            aggregate_column: aggregate_column.into(),
            function,
            header_labels: HeaderLabels::new(),
            show_aggregate: true,
            sheet_name: "Analysis".to_string(),
        }
    }

    pub fn from_query(query: &AggregationQuery) -> Self {
        Self::new(query.group_by.clone(), query.aggregate_column.clone(), query.function)
    }

    pub fn with_labels(mut self, labels: HeaderLabels) -> Self {
        self.header_labels = labels;
        self
    }

    pub fn with_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    pub fn without_aggregate(mut self) -> Self {
        self.show_aggregate = false;
        self
    }

    /// Label key of the aggregate column, e.g. `avg(price)`.
    pub fn aggregate_key(&self) -> String {
        self.function.label_for(&self.aggregate_column)
    }

    /// Header cells in output order: group-by columns, count, aggregate.
    pub fn header_row(&self) -> Vec<String> {
        let mut headers: Vec<String> = self
            .group_by
            .iter()
            .map(|c| self.header_labels.label_or(c, c))
            .collect();

        headers.push(self.header_labels.label_or(COUNT_LABEL_KEY, DEFAULT_COUNT_LABEL));

        if self.show_aggregate {
            let key = self.aggregate_key();
            headers.push(self.header_labels.label_or(&key, &key));
        }
        headers
    }

    pub fn column_count(&self) -> usize {
        self.group_by.len() + if self.show_aggregate { 2 } else { 1 }
    }
}
