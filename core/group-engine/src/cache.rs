//! FILENAME: core/group-engine/src/cache.rs
//! Group Cache - Group keys and running aggregates.
//!
//! Each distinct group key owns one accumulator. The accumulator keeps just
//! enough state to answer every supported function after a single pass.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use engine::{FieldValue, Record};

use crate::definition::AggregateFunction;

// ============================================================================
// GROUP KEY
// ============================================================================

/// Most queries group by a handful of columns; keep those inline.
pub type KeyValues = SmallVec<[Option<String>; 4]>;

/// Composite key of group-by values, one component per group-by column.
/// `None` stands for a missing field or a null value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub values: KeyValues,
}

impl GroupKey {
    pub fn new(values: KeyValues) -> Self {
        GroupKey { values }
    }

    /// Builds the key for `record` by looking up each column by name.
    pub fn from_record(record: &Record, columns: &[String]) -> Self {
        GroupKey {
            values: columns
                .iter()
                .map(|c| record.get(c).and_then(FieldValue::display_value))
                .collect(),
        }
    }

    /// The component at `level`, or None when it is null or out of range.
    pub fn component(&self, level: usize) -> Option<&str> {
        self.values.get(level).and_then(|v| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<Option<S>> for GroupKey {
    fn from_iter<I: IntoIterator<Item = Option<S>>>(iter: I) -> Self {
        GroupKey {
            values: iter.into_iter().map(|v| v.map(Into::into)).collect(),
        }
    }
}

// ============================================================================
// AGGREGATE ACCUMULATOR
// ============================================================================

/// Accumulator for computing aggregates incrementally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateAccumulator {
    /// Sum with non-numeric values counted as 0.
    pub sum: f64,
    /// Records seen, regardless of value.
    pub count: u64,
    /// Records where the field is present and not null. Divisor for avg.
    pub avg_count: u64,
    pub numeric_count: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl AggregateAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one record's aggregate field. A missing or null field only
    /// counts toward `count`; a present non-numeric value also counts
    /// toward the avg divisor as 0.
    pub fn add(&mut self, field: Option<&FieldValue>) {
        self.count += 1;

        let Some(field) = field.filter(|f| !f.is_null()) else {
            return;
        };
        self.avg_count += 1;

        if let Some(v) = field.as_number() {
            self.numeric_count += 1;
            self.sum += v;
            self.min = Some(self.min.map_or(v, |m| m.min(v)));
            self.max = Some(self.max.map_or(v, |m| m.max(v)));
        }
    }

    /// Computes the final aggregate value.
    /// Min/Max are None when the group held no numeric value; Avg is None
    /// when no record carried the field.
    pub fn compute(&self, function: AggregateFunction) -> Option<f64> {
        match function {
            AggregateFunction::Sum => Some(self.sum),
            AggregateFunction::Count => Some(self.count as f64),
            AggregateFunction::Avg => {
                if self.avg_count > 0 {
                    Some(self.sum / self.avg_count as f64)
                } else {
                    None
                }
            }
            AggregateFunction::Min => self.min,
            AggregateFunction::Max => self.max,
        }
    }
}
