//! FILENAME: core/group-engine/src/engine.rs
//! Group Engine - The calculation core that turns records into grouped results.
//!
//! This module takes an AggregationQuery (configuration) and the stored
//! records (data) and produces one AggregationRow per distinct group key.
//!
//! Algorithm:
//! 1. Validate the query (no record is touched on failure)
//! 2. Scan every record once, building its group key by name lookup
//! 3. Feed the coerced aggregate value into the group's accumulator
//! 4. Compute final values, apply the threshold as a HAVING filter
//! 5. Order by aggregate value descending

use std::cmp::Ordering;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use engine::Record;

use crate::cache::{AggregateAccumulator, GroupKey};
use crate::definition::AggregationQuery;
use crate::error::GroupingError;

// ============================================================================
// RESULT TYPES
// ============================================================================

/// One result row per distinct group key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationRow {
    pub key: GroupKey,
    pub aggregate_value: Option<f64>,
    pub count: u64,
}

/// Rows plus the diagnostics gathered during the scan.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregationOutcome {
    pub rows: Vec<AggregationRow>,

    /// Requested columns that no record carries. Their key components are null.
    pub missing_columns: Vec<String>,

    pub records_scanned: usize,
}

// ============================================================================
// GROUP CALCULATOR
// ============================================================================

/// Single-pass grouping state for one query.
pub struct GroupCalculator<'a> {
    query: &'a AggregationQuery,

    /// Group slots in first-encountered order.
    groups: Vec<(GroupKey, AggregateAccumulator)>,

    /// Group key -> slot in `groups`.
    index: FxHashMap<GroupKey, usize>,

    /// Columns read by the query, and whether any record carried them.
    columns: Vec<(&'a str, bool)>,

    records_scanned: usize,
}

impl<'a> GroupCalculator<'a> {
    pub fn new(query: &'a AggregationQuery) -> Self {
        GroupCalculator {
            query,
            groups: Vec::new(),
            index: FxHashMap::default(),
            columns: query
                .referenced_columns()
                .into_iter()
                .map(|c| (c, false))
                .collect(),
            records_scanned: 0,
        }
    }

    pub fn add_record(&mut self, record: &Record) {
        self.records_scanned += 1;
        for (column, seen) in self.columns.iter_mut() {
            if !*seen && record.contains_key(column) {
                *seen = true;
            }
        }

        let key = GroupKey::from_record(record, &self.query.group_by);
        let field = record.get(&self.query.aggregate_column);

        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = self.groups.len();
                self.index.insert(key.clone(), slot);
                self.groups.push((key, AggregateAccumulator::new()));
                slot
            }
        };
        self.groups[slot].1.add(field);
    }

    /// Computes final values, applies the threshold and sorts.
    pub fn finish(self) -> AggregationOutcome {
        let function = self.query.function;

        let missing_columns: Vec<String> = if self.records_scanned == 0 {
            Vec::new()
        } else {
            self.columns
                .iter()
                .filter(|(_, seen)| !*seen)
                .map(|(c, _)| c.to_string())
                .collect()
        };
        for column in &missing_columns {
            log::warn!(target: "GROUP", "{}", GroupingError::ColumnNotFound(column.clone()));
        }

        let mut rows: Vec<AggregationRow> = self
            .groups
            .into_iter()
            .map(|(key, acc)| AggregationRow {
                aggregate_value: acc.compute(function),
                count: acc.count,
                key,
            })
            .collect();

        if let Some(threshold) = &self.query.threshold {
            rows.retain(|row| threshold.matches(row.aggregate_value));
        }

        sort_by_aggregate_desc(&mut rows);

        AggregationOutcome {
            rows,
            missing_columns,
            records_scanned: self.records_scanned,
        }
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Groups `records` by the query's columns and aggregates each group.
pub fn aggregate(
    records: &[Record],
    query: &AggregationQuery,
) -> Result<AggregationOutcome, GroupingError> {
    query.validate()?;

    let mut calculator = GroupCalculator::new(query);
    for record in records {
        calculator.add_record(record);
    }
    let outcome = calculator.finish();

    log::debug!(
        target: "GROUP",
        "aggregate group_by={:?} {} scanned={} groups={}",
        query.group_by,
        query.aggregate_label(),
        outcome.records_scanned,
        outcome.rows.len()
    );
    Ok(outcome)
}

/// Descending by aggregate value. Rows without a value sort last.
pub fn compare_aggregate_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Default result order. Stable, so ties keep first-encountered order.
pub fn sort_by_aggregate_desc(rows: &mut [AggregationRow]) {
    rows.sort_by(|a, b| compare_aggregate_desc(a.aggregate_value, b.aggregate_value));
}

/// Presentation order: first key component ascending (null first), then
/// aggregate value descending. Rows sharing a first value end up contiguous.
pub fn order_by_first_column(rows: &mut [AggregationRow]) {
    rows.sort_by(|a, b| {
        a.key
            .component(0)
            .cmp(&b.key.component(0))
            .then_with(|| compare_aggregate_desc(a.aggregate_value, b.aggregate_value))
    });
}
