//! FILENAME: core/report-engine/src/view.rs
//! Report View - Renderable grid for the spreadsheet export.
//!
//! Turns grouped result rows into a 2D grid: one header row followed by
//! one row per group. Consecutive rows sharing the first group-by value
//! form a run; the run's first-column cells are merged into one visual
//! cell. Writers only need to walk the grid and apply the style hints.

use serde::{Deserialize, Serialize};
use group_engine::{order_by_first_column, AggregationRow};

use crate::definition::ReportDefinition;

// ============================================================================
// CELL TYPES
// ============================================================================

/// Display value for a report cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReportCellValue {
    Empty,
    Number(f64),
    Text(String),
}

impl ReportCellValue {
    pub fn text(s: impl Into<String>) -> Self {
        ReportCellValue::Text(s.into())
    }
}

impl From<Option<f64>> for ReportCellValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(ReportCellValue::Empty, ReportCellValue::Number)
    }
}

impl From<Option<&str>> for ReportCellValue {
    fn from(value: Option<&str>) -> Self {
        value.map_or(ReportCellValue::Empty, ReportCellValue::text)
    }
}

/// Style hints. Every style is drawn with thin borders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportCellStyle {
    /// Column header: bold on light grey (E0E0E0).
    Header,
    /// First-column cell of a run: bold on lighter grey (F5F5F5).
    GroupHeader,
    /// Plain bordered cell.
    Data,
}

impl Default for ReportCellStyle {
    fn default() -> Self {
        ReportCellStyle::Data
    }
}

// ============================================================================
// VIEW CELL
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportCell {
    pub value: ReportCellValue,
    pub style: ReportCellStyle,

    /// Rows covered by this cell (1 unless it starts a merged run).
    pub row_span: u32,

    /// Whether this cell is covered by a merged cell above it.
    /// Covered cells are not written on their own.
    pub is_spanned: bool,
}

impl ReportCell {
    pub fn header(label: impl Into<String>) -> Self {
        ReportCell {
            value: ReportCellValue::text(label),
            style: ReportCellStyle::Header,
            row_span: 1,
            is_spanned: false,
        }
    }

    pub fn data(value: ReportCellValue) -> Self {
        ReportCell {
            value,
            style: ReportCellStyle::Data,
            row_span: 1,
            is_spanned: false,
        }
    }
}

/// A vertical merge in one column, inclusive grid row indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSpan {
    pub col: usize,
    pub first_row: usize,
    pub last_row: usize,
}

// ============================================================================
// REPORT VIEW
// ============================================================================

/// The complete grid. Row 0 is the header row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportView {
    pub sheet_name: String,
    pub col_count: usize,
    pub rows: Vec<Vec<ReportCell>>,
    pub merges: Vec<MergeSpan>,
}

impl ReportView {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of group rows below the header.
    pub fn data_row_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&ReportCell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Builds the export grid. Rows are ordered by the first group-by value
/// (null first), then by aggregate descending within a value.
pub fn build_report_view(rows: &[AggregationRow], definition: &ReportDefinition) -> ReportView {
    let mut ordered = rows.to_vec();
    order_by_first_column(&mut ordered);

    let mut grid: Vec<Vec<ReportCell>> = Vec::with_capacity(ordered.len() + 1);
    grid.push(definition.header_row().into_iter().map(ReportCell::header).collect());

    for row in &ordered {
        let mut cells: Vec<ReportCell> = (0..definition.group_by.len())
            .map(|level| ReportCell::data(row.key.component(level).into()))
            .collect();

        cells.push(ReportCell::data(ReportCellValue::Number(row.count as f64)));
        if definition.show_aggregate {
            cells.push(ReportCell::data(row.aggregate_value.into()));
        }
        grid.push(cells);
    }

    let merges = if definition.group_by.is_empty() {
        Vec::new()
    } else {
        mark_first_column_runs(&mut grid, &ordered)
    };

    ReportView {
        sheet_name: definition.sheet_name.clone(),
        col_count: definition.column_count(),
        rows: grid,
        merges,
    }
}

/// Styles each run's first cell as a group header and records merges for
/// runs longer than one row. Grid row = result index + 1.
fn mark_first_column_runs(grid: &mut [Vec<ReportCell>], ordered: &[AggregationRow]) -> Vec<MergeSpan> {
    let mut merges = Vec::new();
    let mut start = 0;

    while start < ordered.len() {
        let value = ordered[start].key.component(0);
        let mut end = start + 1;
        while end < ordered.len() && ordered[end].key.component(0) == value {
            end += 1;
        }

        let len = end - start;
        let first = start + 1;
        if let Some(cell) = grid[first].first_mut() {
            cell.style = ReportCellStyle::GroupHeader;
            cell.row_span = len as u32;
        }
        for covered in &mut grid[first + 1..first + len] {
            if let Some(cell) = covered.first_mut() {
                cell.style = ReportCellStyle::GroupHeader;
                cell.is_spanned = true;
            }
        }
        if len > 1 {
            merges.push(MergeSpan {
                col: 0,
                first_row: first,
                last_row: first + len - 1,
            });
        }

        start = end;
    }

    merges
}
