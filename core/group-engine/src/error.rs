//! FILENAME: core/group-engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GroupingError {
    #[error("At least one group-by column is required")]
    EmptyGroupBy,

    #[error("The {0} field must not contain blank column names")]
    EmptyColumnName(&'static str),

    #[error("Invalid aggregate function: {0} (expected one of sum, avg, count, min, max)")]
    InvalidAggregateFunction(String),

    #[error("Invalid threshold operator: {0} (expected one of >, <, >=, <=, =, !=)")]
    InvalidThresholdOperator(String),

    #[error("Invalid threshold value: {0}")]
    InvalidThresholdValue(String),

    /// Soft error: reported and logged, never returned from `aggregate`.
    #[error("Column not found on any record: {0}")]
    ColumnNotFound(String),
}
