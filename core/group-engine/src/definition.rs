//! FILENAME: core/group-engine/src/definition.rs
//! Aggregation Definition - The serializable query configuration.
//!
//! This module contains all the types needed to DESCRIBE a group-by query.
//! These structures are designed to be:
//! - Deserialized straight from request bodies
//! - Validated before any record is touched
//! - Immutable snapshots of user intent

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GroupingError;

// ============================================================================
// AGGREGATION
// ============================================================================

/// Supported aggregation functions for the aggregate column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFunction {
    Sum,
    Avg,
    Count,
    Min,
    Max,
}

impl Default for AggregateFunction {
    fn default() -> Self {
        AggregateFunction::Sum
    }
}

impl AggregateFunction {
    pub const ALL: [AggregateFunction; 5] = [
        AggregateFunction::Sum,
        AggregateFunction::Avg,
        AggregateFunction::Count,
        AggregateFunction::Min,
        AggregateFunction::Max,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Count => "count",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
        }
    }

    /// Column label used for the aggregate, e.g. `sum(sales)`.
    pub fn label_for(&self, column: &str) -> String {
        format!("{}({})", self.as_str(), column)
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregateFunction {
    type Err = GroupingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        AggregateFunction::ALL
            .into_iter()
            .find(|f| f.as_str() == name)
            .ok_or_else(|| GroupingError::InvalidAggregateFunction(s.to_string()))
    }
}

// ============================================================================
// THRESHOLD (HAVING)
// ============================================================================

/// Comparison applied to each group's aggregate value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdOperator {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    #[serde(rename = "=")]
    Equals,
    #[serde(rename = "!=", alias = "<>")]
    NotEquals,
}

impl Default for ThresholdOperator {
    fn default() -> Self {
        ThresholdOperator::GreaterThan
    }
}

impl ThresholdOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            ThresholdOperator::GreaterThan => ">",
            ThresholdOperator::LessThan => "<",
            ThresholdOperator::GreaterThanOrEqual => ">=",
            ThresholdOperator::LessThanOrEqual => "<=",
            ThresholdOperator::Equals => "=",
            ThresholdOperator::NotEquals => "!=",
        }
    }

    pub fn compare(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            ThresholdOperator::GreaterThan => lhs > rhs,
            ThresholdOperator::LessThan => lhs < rhs,
            ThresholdOperator::GreaterThanOrEqual => lhs >= rhs,
            ThresholdOperator::LessThanOrEqual => lhs <= rhs,
            ThresholdOperator::Equals => lhs == rhs,
            ThresholdOperator::NotEquals => lhs != rhs,
        }
    }
}

impl fmt::Display for ThresholdOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for ThresholdOperator {
    type Err = GroupingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ">" => Ok(ThresholdOperator::GreaterThan),
            "<" => Ok(ThresholdOperator::LessThan),
            ">=" => Ok(ThresholdOperator::GreaterThanOrEqual),
            "<=" => Ok(ThresholdOperator::LessThanOrEqual),
            "=" => Ok(ThresholdOperator::Equals),
            "!=" | "<>" => Ok(ThresholdOperator::NotEquals),
            _ => Err(GroupingError::InvalidThresholdOperator(s.to_string())),
        }
    }
}

/// A post-aggregation filter, analogous to a HAVING clause.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub operator: ThresholdOperator,
    pub value: f64,
}

impl Threshold {
    pub fn new(operator: ThresholdOperator, value: f64) -> Self {
        Threshold { operator, value }
    }

    /// Parses an operator symbol and a textual value (as sent in query strings).
    pub fn parse(operator: &str, value: &str) -> Result<Self, GroupingError> {
        let operator = operator.parse()?;
        let value = value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| GroupingError::InvalidThresholdValue(value.to_string()))?;
        Ok(Threshold { operator, value })
    }

    /// A group without an aggregate value never matches.
    pub fn matches(&self, aggregate_value: Option<f64>) -> bool {
        aggregate_value.is_some_and(|v| self.operator.compare(v, self.value))
    }
}

// ============================================================================
// QUERY
// ============================================================================

/// The complete description of one group-by/aggregate query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationQuery {
    /// Columns forming the composite group key, outermost first.
    pub group_by: Vec<String>,

    /// Column whose values are aggregated.
    pub aggregate_column: String,

    /// The aggregation function to apply.
    pub function: AggregateFunction,

    /// Optional HAVING-style filter on the aggregate value.
    #[serde(default)]
    pub threshold: Option<Threshold>,
}

impl AggregationQuery {
    pub fn new(
        group_by: Vec<String>,
        aggregate_column: impl Into<String>,
        function: AggregateFunction,
    ) -> Self {
        AggregationQuery {
            group_by,
            aggregate_column: aggregate_column.into(),
            function,
            threshold: None,
        }
    }

    pub fn with_threshold(mut self, threshold: Threshold) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Rejects malformed queries before the store is scanned.
    pub fn validate(&self) -> Result<(), GroupingError> {
        if self.group_by.is_empty() {
            return Err(GroupingError::EmptyGroupBy);
        }
        if self.group_by.iter().any(|c| c.trim().is_empty()) {
            return Err(GroupingError::EmptyColumnName("groupBy"));
        }
        if self.aggregate_column.trim().is_empty() {
            return Err(GroupingError::EmptyColumnName("aggregateColumn"));
        }
        Ok(())
    }

    /// Label of the aggregate column, e.g. `avg(price)`.
    pub fn aggregate_label(&self) -> String {
        self.function.label_for(&self.aggregate_column)
    }

    /// Every column the query reads, group-by columns first, without duplicates.
    pub fn referenced_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::with_capacity(self.group_by.len() + 1);
        for column in self
            .group_by
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.aggregate_column.as_str()))
        {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_function_names() {
        assert_eq!("sum".parse::<AggregateFunction>().unwrap(), AggregateFunction::Sum);
        assert_eq!("AVG".parse::<AggregateFunction>().unwrap(), AggregateFunction::Avg);
        assert_eq!(" max ".parse::<AggregateFunction>().unwrap(), AggregateFunction::Max);
        assert!(matches!(
            "median".parse::<AggregateFunction>(),
            Err(GroupingError::InvalidAggregateFunction(name)) if name == "median"
        ));
    }

    #[test]
    fn test_function_serde_is_lowercase() {
        let f: AggregateFunction = serde_json::from_str("\"count\"").unwrap();
        assert_eq!(f, AggregateFunction::Count);
        assert_eq!(serde_json::to_string(&AggregateFunction::Min).unwrap(), "\"min\"");
    }

    #[test]
    fn test_operators() {
        assert_eq!("<>".parse::<ThresholdOperator>().unwrap(), ThresholdOperator::NotEquals);
        assert!("=>".parse::<ThresholdOperator>().is_err());

        let op: ThresholdOperator = serde_json::from_str("\">=\"").unwrap();
        assert_eq!(op, ThresholdOperator::GreaterThanOrEqual);
        assert!(op.compare(10.0, 10.0));
        assert!(!ThresholdOperator::GreaterThan.compare(10.0, 10.0));
    }

    #[test]
    fn test_threshold_parse_and_match() {
        let t = Threshold::parse(">", "10").unwrap();
        assert!(t.matches(Some(30.0)));
        assert!(!t.matches(Some(5.0)));
        assert!(!t.matches(None));

        assert!(matches!(
            Threshold::parse(">", "ten"),
            Err(GroupingError::InvalidThresholdValue(_))
        ));
    }

    #[test]
    fn test_validate() {
        let q = AggregationQuery::new(vec![], "sales", AggregateFunction::Sum);
        assert!(matches!(q.validate(), Err(GroupingError::EmptyGroupBy)));

        let q = AggregationQuery::new(vec!["region".into()], " ", AggregateFunction::Sum);
        assert!(matches!(q.validate(), Err(GroupingError::EmptyColumnName(_))));

        let q = AggregationQuery::new(vec!["region".into()], "sales", AggregateFunction::Sum);
        assert!(q.validate().is_ok());
        assert_eq!(q.aggregate_label(), "sum(sales)");
    }

    #[test]
    fn test_referenced_columns_dedup() {
        let q = AggregationQuery::new(
            vec!["region".into(), "sales".into()],
            "sales",
            AggregateFunction::Count,
        );
        assert_eq!(q.referenced_columns(), vec!["region", "sales"]);
    }
}
