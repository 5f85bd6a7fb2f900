//! FILENAME: core/pivot-engine/src/view.rs
//! Pivot View - output-ready rows for the writer.
//!
//! The view is the count table laid out as a two-level index: one row per
//! `(main, secondary)` key, sorted, with a single count column. When index cells
//! are merged, consecutive rows sharing a main value form one vertical span.

use serde::{Deserialize, Serialize};

use crate::cache::CountTable;
use crate::definition::FilterSpec;

/// One output row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotViewRow {
    pub main: String,
    pub secondary: String,
    pub count: u64,
}

/// A run of rows (inclusive, 0-based into `PivotView::rows`) sharing one main value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedSpan {
    pub first_row: usize,
    pub last_row: usize,
}

impl MergedSpan {
    pub fn row_count(&self) -> usize {
        self.last_row - self.first_row + 1
    }
}

/// The rendered table handed to the writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotView {
    /// Main column name, secondary column name, count column name.
    pub headers: Vec<String>,

    pub rows: Vec<PivotViewRow>,

    /// Whether repeated main values are written once per span.
    pub merge_cells: bool,

    /// Spans of the main column. Empty unless `merge_cells` is set.
    pub merged_spans: Vec<MergedSpan>,
}

impl PivotView {
    pub fn from_table(table: &CountTable, spec: &FilterSpec, merge_cells: bool) -> Self {
        let rows: Vec<PivotViewRow> = table
            .sorted_entries()
            .into_iter()
            .map(|(key, count)| PivotViewRow {
                main: key.main.clone(),
                secondary: key.secondary.clone(),
                count,
            })
            .collect();

        let merged_spans = if merge_cells {
            main_spans(&rows)
        } else {
            Vec::new()
        };

        PivotView {
            headers: vec![
                spec.main_column.clone(),
                spec.secondary_column.clone(),
                spec.count_column_name(),
            ],
            rows,
            merge_cells,
            merged_spans,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_count(&self) -> u64 {
        self.rows.iter().map(|r| r.count).sum()
    }
}

fn main_spans(rows: &[PivotViewRow]) -> Vec<MergedSpan> {
    let mut spans: Vec<MergedSpan> = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        if let Some(span) = spans.last_mut() {
            if rows[span.first_row].main == row.main {
                span.last_row = index;
                continue;
            }
        }
        spans.push(MergedSpan {
            first_row: index,
            last_row: index,
        });
    }
    spans
}
