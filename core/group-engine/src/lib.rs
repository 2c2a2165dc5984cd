//! FILENAME: core/group-engine/src/lib.rs
//! Group-by/aggregate subsystem.
//!
//! This crate provides the aggregation engine as a standalone module,
//! separate from the record store. It depends on `engine` only for the
//! shared record types (Record, FieldValue).
//!
//! Layers:
//! - `definition`: Serializable query configuration (what the query IS)
//! - `cache`: Group keys and running accumulators (HOW we accumulate)
//! - `engine`: The single-pass scan (HOW we calculate)

pub mod cache;
pub mod definition;
pub mod engine;
pub mod error;

pub use cache::{AggregateAccumulator, GroupKey, KeyValues};
pub use definition::*;
pub use crate::engine::{
    aggregate, compare_aggregate_desc, order_by_first_column, sort_by_aggregate_desc,
    AggregationOutcome, AggregationRow, GroupCalculator,
};
pub use error::GroupingError;
