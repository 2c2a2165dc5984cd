//! FILENAME: core/report-engine/src/engine.rs
//! Report Shaper - Turns flat grouped results into a group hierarchy.
//!
//! The first group-by column forms the outer groups; each remaining column
//! nests one level deeper. Leaves hold the original result rows.
//!
//! Every node carries two totals:
//! - `aggregate_total`: plain sum of the descendants' aggregate values.
//!   For `avg`, `min` and `max` this is a display total only and does not
//!   equal the aggregate over the subtree.
//! - `rollup_value`: the aggregate re-derived for the subtree (count-weighted
//!   mean for `avg`, extreme for `min`/`max`, sum otherwise).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use group_engine::{AggregateFunction, AggregationRow};

// ============================================================================
// TREE STRUCTURES
// ============================================================================

/// One node of the hierarchy: all rows sharing a value at `level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportGroup {
    /// The group-by column this node splits on.
    pub column: String,

    /// The key component at this level (None for null/missing).
    pub value: Option<String>,

    /// Index into the group-by columns (0 = outermost).
    pub level: usize,

    pub aggregate_total: f64,
    pub count_total: u64,
    pub rollup_value: Option<f64>,

    /// Nested groups (empty at the last level).
    pub children: Vec<ReportGroup>,

    /// Result rows (only at the last level).
    pub rows: Vec<AggregationRow>,
}

impl ReportGroup {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of result rows below this node.
    pub fn row_count(&self) -> usize {
        if self.is_leaf() {
            self.rows.len()
        } else {
            self.children.iter().map(ReportGroup::row_count).sum()
        }
    }
}

/// The root of the hierarchy with grand totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTree {
    pub group_by: Vec<String>,
    pub function: AggregateFunction,
    pub aggregate_total: f64,
    pub count_total: u64,
    pub rollup_value: Option<f64>,
    pub groups: Vec<ReportGroup>,
}

// ============================================================================
// SHAPER
// ============================================================================

/// Builds the hierarchy. Groups at every level follow first-encountered
/// order of the input rows, so sorted input yields sorted groups.
pub fn shape(rows: &[AggregationRow], group_by: &[String], function: AggregateFunction) -> ReportTree {
    let refs: Vec<&AggregationRow> = rows.iter().collect();
    let groups = build_level(&refs, group_by, 0, function);

    let (aggregate_total, count_total) = sum_totals(rows.iter().map(|r| (r.aggregate_value, r.count)));
    let rollup_value = if groups.is_empty() {
        rollup(function, rows.iter().map(|r| (r.aggregate_value, r.count)))
    } else {
        rollup(function, groups.iter().map(|g| (g.rollup_value, g.count_total)))
    };

    ReportTree {
        group_by: group_by.to_vec(),
        function,
        aggregate_total,
        count_total,
        rollup_value,
        groups,
    }
}

fn build_level(
    rows: &[&AggregationRow],
    group_by: &[String],
    level: usize,
    function: AggregateFunction,
) -> Vec<ReportGroup> {
    let Some(column) = group_by.get(level) else {
        return Vec::new();
    };

    // Partition by the component at this level, keeping first-seen order.
    let mut order: Vec<Option<&str>> = Vec::new();
    let mut buckets: HashMap<Option<&str>, Vec<&AggregationRow>> = HashMap::new();
    for row in rows {
        let value = row.key.component(level);
        buckets
            .entry(value)
            .or_insert_with(|| {
                order.push(value);
                Vec::new()
            })
            .push(row);
    }

    let is_last = level + 1 >= group_by.len();

    order
        .into_iter()
        .map(|value| {
            let members = buckets.remove(&value).unwrap_or_default();
            let (aggregate_total, count_total) =
                sum_totals(members.iter().map(|r| (r.aggregate_value, r.count)));

            let (children, leaf_rows, rollup_value) = if is_last {
                let rollup_value = rollup(function, members.iter().map(|r| (r.aggregate_value, r.count)));
                (Vec::new(), members.into_iter().cloned().collect(), rollup_value)
            } else {
                let children = build_level(&members, group_by, level + 1, function);
                let rollup_value = rollup(function, children.iter().map(|c| (c.rollup_value, c.count_total)));
                (children, Vec::new(), rollup_value)
            };

            ReportGroup {
                column: column.clone(),
                value: value.map(str::to_string),
                level,
                aggregate_total,
                count_total,
                rollup_value,
                children,
                rows: leaf_rows,
            }
        })
        .collect()
}

fn sum_totals(parts: impl Iterator<Item = (Option<f64>, u64)>) -> (f64, u64) {
    parts.fold((0.0, 0), |(agg, count), (v, c)| (agg + v.unwrap_or(0.0), count + c))
}

/// Re-derives the aggregate over parts given as (value, record count).
fn rollup(function: AggregateFunction, parts: impl Iterator<Item = (Option<f64>, u64)>) -> Option<f64> {
    match function {
        AggregateFunction::Sum | AggregateFunction::Count => {
            Some(parts.map(|(v, _)| v.unwrap_or(0.0)).sum())
        }
        AggregateFunction::Avg => {
            let (weighted, count) = parts
                .filter_map(|(v, c)| v.map(|v| (v, c)))
                .fold((0.0, 0u64), |(w, n), (v, c)| (w + v * c as f64, n + c));
            if count > 0 {
                Some(weighted / count as f64)
            } else {
                None
            }
        }
        AggregateFunction::Min => parts.filter_map(|(v, _)| v).reduce(f64::min),
        AggregateFunction::Max => parts.filter_map(|(v, _)| v).reduce(f64::max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::{FieldValue, Record};
    use group_engine::{aggregate, AggregationQuery};

    fn row(key: &[&str], value: f64, count: u64) -> AggregationRow {
        AggregationRow {
            key: key.iter().map(|k| Some(*k)).collect(),
            aggregate_value: Some(value),
            count,
        }
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_two_level_shape() {
        let rows = vec![
            row(&["North", "Apples"], 10.0, 2),
            row(&["South", "Apples"], 7.0, 1),
            row(&["North", "Pears"], 5.0, 3),
        ];
        let tree = shape(&rows, &columns(&["region", "product"]), AggregateFunction::Sum);

        assert_eq!(tree.groups.len(), 2);
        let north = &tree.groups[0];
        assert_eq!(north.value.as_deref(), Some("North"));
        assert_eq!(north.column, "region");
        assert_eq!(north.aggregate_total, 15.0);
        assert_eq!(north.count_total, 5);
        assert_eq!(north.children.len(), 2);
        assert_eq!(north.children[1].value.as_deref(), Some("Pears"));
        assert_eq!(north.children[1].level, 1);
        assert_eq!(north.children[1].rows, vec![row(&["North", "Pears"], 5.0, 3)]);
        assert_eq!(north.row_count(), 2);

        assert_eq!(tree.aggregate_total, 22.0);
        assert_eq!(tree.count_total, 6);
        assert_eq!(tree.rollup_value, Some(22.0));
    }

    #[test]
    fn test_insertion_order_not_sorted() {
        let rows = vec![row(&["b"], 1.0, 1), row(&["a"], 2.0, 1), row(&["b"], 3.0, 1)];
        let tree = shape(&rows, &columns(&["k"]), AggregateFunction::Sum);

        let values: Vec<_> = tree.groups.iter().map(|g| g.value.as_deref()).collect();
        assert_eq!(values, vec![Some("b"), Some("a")]);
    }

    #[test]
    fn test_null_components_form_their_own_group() {
        let rows = vec![
            AggregationRow { key: [None::<&str>].into_iter().collect(), aggregate_value: Some(4.0), count: 2 },
            row(&["x"], 1.0, 1),
        ];
        let tree = shape(&rows, &columns(&["k"]), AggregateFunction::Sum);
        assert_eq!(tree.groups[0].value, None);
        assert_eq!(tree.groups[0].count_total, 2);
    }

    #[test]
    fn test_avg_rollup_is_weighted_but_total_is_raw_sum() {
        // Region A: prices 10, 20 in product p; 60 in product q.
        let records: Vec<Record> = [("A", "p", 10.0), ("A", "p", 20.0), ("A", "q", 60.0)]
            .iter()
            .map(|(r, p, v)| {
                [
                    ("region", FieldValue::text(*r)),
                    ("product", FieldValue::text(*p)),
                    ("price", FieldValue::Number(*v)),
                ]
                .into_iter()
                .collect()
            })
            .collect();
        let query = AggregationQuery::new(columns(&["region", "product"]), "price", AggregateFunction::Avg);
        let outcome = aggregate(&records, &query).unwrap();

        let tree = shape(&outcome.rows, &query.group_by, query.function);
        let a = &tree.groups[0];

        // Sub-averages are 15 and 60; their raw sum is not an average.
        assert_eq!(a.aggregate_total, 75.0);
        // True average of 10, 20, 60.
        assert_eq!(a.rollup_value, Some(30.0));
        assert_eq!(tree.rollup_value, Some(30.0));
    }

    #[test]
    fn test_min_max_rollup() {
        let rows = vec![
            row(&["a", "x"], 3.0, 1),
            row(&["a", "y"], -1.0, 1),
            AggregationRow { key: [Some("a"), Some("z")].into_iter().collect(), aggregate_value: None, count: 1 },
        ];
        let min_tree = shape(&rows, &columns(&["g", "h"]), AggregateFunction::Min);
        assert_eq!(min_tree.groups[0].rollup_value, Some(-1.0));
        assert_eq!(min_tree.groups[0].children[2].rollup_value, None);

        let max_tree = shape(&rows, &columns(&["g", "h"]), AggregateFunction::Max);
        assert_eq!(max_tree.groups[0].rollup_value, Some(3.0));
        assert_eq!(max_tree.groups[0].aggregate_total, 2.0);
    }

    #[test]
    fn test_empty_rows() {
        let tree = shape(&[], &columns(&["k"]), AggregateFunction::Avg);
        assert!(tree.groups.is_empty());
        assert_eq!(tree.count_total, 0);
        assert_eq!(tree.rollup_value, None);
    }

    #[test]
    fn test_serializes_camel_case() {
        let tree = shape(&[row(&["a"], 1.0, 1)], &columns(&["k"]), AggregateFunction::Sum);
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["groups"][0]["countTotal"], 1);
        assert_eq!(json["groupBy"][0], "k");
    }
}
