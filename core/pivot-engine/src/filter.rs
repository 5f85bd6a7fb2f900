//! FILENAME: core/pivot-engine/src/filter.rs
//! Record Filter - decides which rows of a batch are counted.
//!
//! Order of evaluation for each batch:
//! 1. Additional-filter columns that are blank across the whole batch carry no
//!    information and are not examined (the filter is skipped for this batch).
//! 2. Main-column substring exclusion.
//! 3. Secondary-column substring exclusion.
//! 4. Additional full-match inclusion filters, in configuration order.
//!
//! Column lookup happens once per schema (`BoundFilter::bind`). A missing
//! additional-filter column is reported and skipped; a missing main or
//! secondary column is fatal for the input.

use engine::{ColumnIndex, RecordBatch, Schema};
use smallvec::SmallVec;

use crate::definition::CompiledFilter;
use crate::diagnostics::DiagnosticSink;
use crate::error::PivotError;

/// Positions into `CompiledFilter::additional()`.
pub type FilterSet = SmallVec<[usize; 4]>;

// ============================================================================
// BOUND FILTER
// ============================================================================

/// A compiled filter resolved against one schema.
#[derive(Debug, Clone)]
pub struct BoundFilter<'f> {
    filter: &'f CompiledFilter,
    main: ColumnIndex,
    secondary: ColumnIndex,
    /// (filter position, column) for every additional filter whose column exists.
    additional: SmallVec<[(usize, ColumnIndex); 4]>,
}

impl<'f> BoundFilter<'f> {
    /// Resolves column names against `schema`.
    pub fn bind(
        schema: &Schema,
        filter: &'f CompiledFilter,
        sink: &dyn DiagnosticSink,
    ) -> Result<Self, PivotError> {
        let spec = filter.spec();
        let main = schema
            .index_of(&spec.main_column)
            .ok_or_else(|| PivotError::MissingColumn(spec.main_column.clone()))?;
        let secondary = schema
            .index_of(&spec.secondary_column)
            .ok_or_else(|| PivotError::MissingColumn(spec.secondary_column.clone()))?;

        let mut additional = SmallVec::new();
        for (position, full_match) in filter.additional().iter().enumerate() {
            match schema.index_of(full_match.column()) {
                Some(column) => additional.push((position, column)),
                None => sink.warn(
                    "FILTER",
                    &format!(
                        "Couldn't find column {} in the input, skipping filter",
                        full_match.column()
                    ),
                ),
            }
        }

        Ok(BoundFilter {
            filter,
            main,
            secondary,
            additional,
        })
    }

    /// Additional filters whose column exists in the bound schema, with the
    /// column each one reads.
    pub fn bound_additional(&self) -> &[(usize, ColumnIndex)] {
        &self.additional
    }

    /// Filters one batch. The batch must carry the schema this filter was bound to.
    pub fn apply<'a>(&self, batch: &'a RecordBatch, sink: &dyn DiagnosticSink) -> FilteredBatch<'a> {
        let mut blank_filters = FilterSet::new();
        if batch.is_empty() {
            return FilteredBatch {
                batch,
                kept: Vec::new(),
                blank_filters,
                main: self.main,
                secondary: self.secondary,
            };
        }

        let mut active: SmallVec<[(usize, ColumnIndex); 4]> = SmallVec::new();
        for &(position, column) in &self.additional {
            if batch.column_is_blank(column) {
                sink.debug(
                    "FILTER",
                    &format!(
                        "Column {} is empty in this batch, filter not applied",
                        self.filter.additional()[position].column()
                    ),
                );
                blank_filters.push(position);
            } else {
                active.push((position, column));
            }
        }

        let additional = self.filter.additional();
        let kept = (0..batch.len())
            .filter(|&row| {
                if self.filter.excludes_main(batch.value(row, self.main)) {
                    return false;
                }
                if self.filter.excludes_secondary(batch.value(row, self.secondary)) {
                    return false;
                }
                active
                    .iter()
                    .all(|&(position, column)| additional[position].is_full_match(batch.value(row, column)))
            })
            .collect();

        FilteredBatch {
            batch,
            kept,
            blank_filters,
            main: self.main,
            secondary: self.secondary,
        }
    }
}

/// One-shot filtering of a standalone batch.
pub fn filter_batch<'a>(
    batch: &'a RecordBatch,
    filter: &CompiledFilter,
    sink: &dyn DiagnosticSink,
) -> Result<FilteredBatch<'a>, PivotError> {
    let bound = BoundFilter::bind(batch.schema(), filter, sink)?;
    Ok(bound.apply(batch, sink))
}

// ============================================================================
// FILTERED BATCH
// ============================================================================

/// The surviving rows of a batch, by reference.
#[derive(Debug, Clone)]
pub struct FilteredBatch<'a> {
    batch: &'a RecordBatch,
    kept: Vec<usize>,
    blank_filters: FilterSet,
    main: ColumnIndex,
    secondary: ColumnIndex,
}

impl<'a> FilteredBatch<'a> {
    pub fn len(&self) -> usize {
        self.kept.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kept.is_empty()
    }

    /// Additional filters skipped because their column was blank in this batch.
    pub fn blank_filters(&self) -> &FilterSet {
        &self.blank_filters
    }

    /// `(main, secondary)` of every surviving row.
    pub fn key_values(&self) -> impl Iterator<Item = (&'a str, &'a str)> + '_ {
        let (batch, main, secondary) = (self.batch, self.main, self.secondary);
        self.kept
            .iter()
            .map(move |&i| (batch.value(i, main), batch.value(i, secondary)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::FilterSpec;
    use crate::diagnostics::{CollectingDiagnostics, NullDiagnostics};

    fn batch() -> RecordBatch {
        RecordBatch::from_rows(vec![
            vec![("Destination", "Jewelry/14-carat/Rings"), ("Anchor", "Gold"), ("Follow", "true")],
            vec![("Destination", "Jewelry/Rings"), ("Anchor", "Yes please"), ("Follow", "false")],
            vec![("Destination", "Jewelry/Rings"), ("Anchor", "Silver"), ("Follow", "maybe")],
            vec![("Destination", ""), ("Anchor", "Menu"), ("Follow", "true")],
        ])
    }

    fn kept(filtered: &FilteredBatch<'_>) -> Vec<usize> {
        filtered.kept.clone()
    }

    fn survivors(filtered: &FilteredBatch<'_>) -> Vec<(String, String)> {
        filtered
            .key_values()
            .map(|(m, s)| (m.to_string(), s.to_string()))
            .collect()
    }

    #[test]
    fn test_main_exclude_drops_substring_matches() {
        let compiled = FilterSpec::new("Destination", "Anchor")
            .with_main_exclude(r"14-carat\/")
            .compile()
            .unwrap();
        let batch = batch();
        let filtered = filter_batch(&batch, &compiled, &NullDiagnostics).unwrap();

        assert_eq!(kept(&filtered), &[1, 2, 3]);
    }

    #[test]
    fn test_secondary_exclude_and_full_match_filters() {
        let compiled = FilterSpec::new("Destination", "Anchor")
            .with_secondary_exclude("Yes|Menu")
            .with_filter("Follow", "true|false")
            .compile()
            .unwrap();
        let batch = batch();
        let filtered = filter_batch(&batch, &compiled, &NullDiagnostics).unwrap();

        assert_eq!(
            survivors(&filtered),
            vec![("Jewelry/14-carat/Rings".to_string(), "Gold".to_string())]
        );
    }

    #[test]
    fn test_full_match_rejects_partial_values() {
        let compiled = FilterSpec::new("Destination", "Anchor")
            .with_filter("Anchor", "Yes")
            .compile()
            .unwrap();
        let batch = RecordBatch::from_rows(vec![
            vec![("Destination", "A"), ("Anchor", "Yes please")],
            vec![("Destination", "A"), ("Anchor", "Yes")],
        ]);
        let filtered = filter_batch(&batch, &compiled, &NullDiagnostics).unwrap();
        assert_eq!(kept(&filtered), &[1]);
    }

    #[test]
    fn test_missing_additional_column_is_skipped_with_warning() {
        let compiled = FilterSpec::new("Destination", "Anchor")
            .with_filter("Follow", "true")
            .with_filter("Anchor", "Blue")
            .compile()
            .unwrap();
        let batch = RecordBatch::from_rows(vec![
            vec![("Destination", "NY"), ("Anchor", "Blue")],
            vec![("Destination", "NY"), ("Anchor", "Red")],
        ]);
        let sink = CollectingDiagnostics::new();
        let filtered = filter_batch(&batch, &compiled, &sink).unwrap();

        // The remaining filter still applies.
        assert_eq!(kept(&filtered), &[0]);
        let warnings = sink.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("Follow"));
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let compiled = FilterSpec::new("Destination", "Anchor").compile().unwrap();
        let batch = RecordBatch::from_rows(vec![vec![("Destination", "NY")]]);

        match filter_batch(&batch, &compiled, &NullDiagnostics) {
            Err(PivotError::MissingColumn(column)) => assert_eq!(column, "Anchor"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_filter_column_is_not_examined() {
        let compiled = FilterSpec::new("Destination", "Anchor")
            .with_filter("Follow", "true")
            .compile()
            .unwrap();
        let batch = RecordBatch::from_rows(vec![
            vec![("Destination", "NY"), ("Anchor", "Blue"), ("Follow", "")],
            vec![("Destination", "LA"), ("Anchor", "Red"), ("Follow", "")],
        ]);
        let filtered = filter_batch(&batch, &compiled, &NullDiagnostics).unwrap();

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.blank_filters().as_slice(), &[0]);
    }

    #[test]
    fn test_empty_values_never_match_exclusions() {
        // "x*" matches the empty string, but blank values are always kept.
        let compiled = FilterSpec::new("Destination", "Anchor")
            .with_main_exclude("x*")
            .compile()
            .unwrap();
        let batch = RecordBatch::from_rows(vec![
            vec![("Destination", ""), ("Anchor", "Blue")],
            vec![("Destination", "abc"), ("Anchor", "Blue")],
        ]);
        let filtered = filter_batch(&batch, &compiled, &NullDiagnostics).unwrap();
        assert_eq!(kept(&filtered), &[0]);
    }
}
