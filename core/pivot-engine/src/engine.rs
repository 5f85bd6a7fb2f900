//! FILENAME: core/pivot-engine/src/engine.rs
//! Pivot Engine - aggregation and the ingest driver.
//!
//! This module takes a `CompiledFilter` (configuration) and a `RecordSource`
//! (data) and produces a `CountTable`.
//!
//! Algorithm:
//! 1. Route: small inputs are read in one batch, large ones in fixed-size chunks
//! 2. Filter each batch (see `filter`)
//! 3. Aggregate surviving rows into a per-batch `PartialPivot`
//! 4. Merge partials (sequentially, or pairwise across rayon workers)
//! 5. Finish: settle tables that were held back because a filter column was
//!    blank in their chunk, then hand the `CountTable` to the caller
//!
//! Whatever the route, chunk size or worker count, the finished table is the
//! one a single whole-input batch would produce.

use std::collections::hash_map::Entry;

use engine::RecordBatch;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::cache::{CountTable, PivotKey};
use crate::definition::{CompiledFilter, PipelineOptions};
use crate::diagnostics::DiagnosticSink;
use crate::error::PivotError;
use crate::filter::{BoundFilter, FilterSet, FilteredBatch};
use crate::source::RecordSource;

// ============================================================================
// AGGREGATION
// ============================================================================

/// Counts the `(main, secondary)` pairs of the surviving rows.
///
/// Rows whose secondary value is blank after trimming are not counted.
pub fn aggregate(rows: &FilteredBatch<'_>) -> CountTable {
    count_pairs(rows.key_values())
}

fn count_pairs<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> CountTable {
    // Borrowed keys while counting; one allocation per distinct pair at the end.
    let mut counts: FxHashMap<(&'a str, &'a str), u64> = FxHashMap::default();
    for (main, secondary) in pairs {
        if secondary.trim().is_empty() {
            continue;
        }
        *counts.entry((main, secondary)).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|((main, secondary), count)| (PivotKey::new(main, secondary), count))
        .collect()
}

// ============================================================================
// PARTIAL RESULTS
// ============================================================================

/// The aggregate of one or more chunks, before the input is fully read.
///
/// A chunk in which an additional-filter column is entirely blank skips that
/// filter. Whether its rows really count depends on the rest of the input: if
/// the column is populated somewhere else, a whole-input run would apply the
/// filter to those blank values too. Such tables are kept in `deferred`, keyed
/// by the set of skipped filters, until `finish` knows the answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialPivot {
    settled: CountTable,
    deferred: FxHashMap<FilterSet, CountTable>,
    /// Additional filters whose column held a value in at least one chunk (sorted).
    populated: FilterSet,
    rows_read: u64,
    chunks: usize,
}

impl PartialPivot {
    /// Filters and aggregates one chunk.
    pub fn from_chunk(bound: &BoundFilter<'_>, batch: &RecordBatch, sink: &dyn DiagnosticSink) -> Self {
        let filtered = bound.apply(batch, sink);
        sink.debug(
            "FILTER",
            &format!("{} of {} rows kept", filtered.len(), batch.len()),
        );
        let table = if filtered.is_empty() {
            CountTable::new()
        } else {
            aggregate(&filtered)
        };
        let blank = filtered.blank_filters().clone();

        let populated: FilterSet = if batch.is_empty() {
            FilterSet::new()
        } else {
            bound
                .bound_additional()
                .iter()
                .map(|&(position, _)| position)
                .filter(|position| !blank.contains(position))
                .collect()
        };

        let mut partial = PartialPivot {
            populated,
            rows_read: batch.len() as u64,
            chunks: 1,
            ..Default::default()
        };
        if blank.is_empty() {
            partial.settled = table;
        } else if !table.is_empty() {
            partial.deferred.insert(blank, table);
        }
        partial
    }

    /// Combines two partials. Commutative and associative, like `CountTable::merge`.
    pub fn merge(mut self, other: PartialPivot) -> PartialPivot {
        self.settled = self.settled.merge(other.settled);

        for (skipped, table) in other.deferred {
            match self.deferred.entry(skipped) {
                Entry::Occupied(mut slot) => slot.get_mut().merge_from(table),
                Entry::Vacant(slot) => {
                    slot.insert(table);
                }
            }
        }

        for position in other.populated {
            if let Err(at) = self.populated.binary_search(&position) {
                self.populated.insert(at, position);
            }
        }

        self.rows_read += other.rows_read;
        self.chunks += other.chunks;
        self
    }

    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    pub fn chunks(&self) -> usize {
        self.chunks
    }

    /// Resolves deferred tables and returns the final counts.
    ///
    /// A deferred table is kept when every filter it skipped is either blank in
    /// the whole input or accepts the empty string.
    pub fn finish(self, filter: &CompiledFilter) -> CountTable {
        let PartialPivot {
            mut settled,
            deferred,
            populated,
            ..
        } = self;

        for (skipped, table) in deferred {
            let passes = skipped.iter().all(|position| {
                populated.binary_search(position).is_err()
                    || filter.additional()[*position].matches_empty()
            });
            if passes {
                settled.merge_from(table);
            }
        }
        settled
    }
}

// ============================================================================
// INGEST ROUTER
// ============================================================================

/// How an input is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestRoute {
    /// One batch holding every record.
    WholeFile,
    /// Fixed-size chunks merged into a running total.
    Chunked,
}

/// Picks the ingest route for an input of `input_bytes` bytes.
pub fn route(input_bytes: u64, options: &PipelineOptions) -> IngestRoute {
    if input_bytes >= options.chunk_threshold_bytes {
        IngestRoute::Chunked
    } else {
        IngestRoute::WholeFile
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Counters collected while running the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PivotStats {
    pub route: IngestRoute,
    pub chunks: usize,
    pub rows_read: u64,
    /// Sum of the final counts.
    pub rows_counted: u64,
}

/// The finished table plus run counters.
#[derive(Debug, Clone)]
pub struct PivotOutcome {
    pub table: CountTable,
    pub stats: PivotStats,
}

/// Reads `source` to the end and returns its count table with run counters.
pub fn run_pipeline<S>(
    source: &mut S,
    filter: &CompiledFilter,
    options: &PipelineOptions,
    sink: &dyn DiagnosticSink,
) -> Result<PivotOutcome, PivotError>
where
    S: RecordSource + ?Sized,
{
    options.validate()?;

    let schema = source.schema().clone();
    let bound = BoundFilter::bind(&schema, filter, sink)?;

    // Sources of unknown size are streamed.
    let route = source
        .size_hint_bytes()
        .map_or(IngestRoute::Chunked, |bytes| route(bytes, options));
    sink.debug(
        "PIPELINE",
        &format!(
            "route={:?} size={:?} chunk_rows={} workers={}",
            route,
            source.size_hint_bytes(),
            options.chunk_rows,
            options.workers
        ),
    );

    let partial = match route {
        IngestRoute::WholeFile => {
            let batch = source
                .next_batch(usize::MAX)?
                .unwrap_or_else(|| RecordBatch::new(schema.clone()));
            ensure_schema(&batch, &schema)?;
            PartialPivot::from_chunk(&bound, &batch, sink)
        }
        IngestRoute::Chunked if options.workers <= 1 => {
            let mut running = PartialPivot::default();
            while let Some(batch) = source.next_batch(options.chunk_rows)? {
                ensure_schema(&batch, &schema)?;
                running = running.merge(PartialPivot::from_chunk(&bound, &batch, sink));
            }
            running
        }
        IngestRoute::Chunked => {
            let mut running = PartialPivot::default();
            loop {
                let mut wave = Vec::with_capacity(options.workers);
                while wave.len() < options.workers {
                    match source.next_batch(options.chunk_rows)? {
                        Some(batch) => {
                            ensure_schema(&batch, &schema)?;
                            wave.push(batch);
                        }
                        None => break,
                    }
                }
                if wave.is_empty() {
                    break;
                }
                let exhausted = wave.len() < options.workers;

                let combined = wave
                    .par_iter()
                    .map(|batch| PartialPivot::from_chunk(&bound, batch, sink))
                    .reduce(PartialPivot::default, PartialPivot::merge);
                running = running.merge(combined);

                if exhausted {
                    break;
                }
            }
            running
        }
    };

    let chunks = partial.chunks();
    let rows_read = partial.rows_read();
    let table = partial.finish(filter);
    let stats = PivotStats {
        route,
        chunks,
        rows_read,
        rows_counted: table.total(),
    };
    sink.debug(
        "PIPELINE",
        &format!(
            "chunks={} rows_read={} rows_counted={} keys={}",
            stats.chunks,
            stats.rows_read,
            stats.rows_counted,
            table.len()
        ),
    );

    Ok(PivotOutcome { table, stats })
}

/// Reads `source` to the end and returns its count table.
pub fn process_source<S>(
    source: &mut S,
    filter: &CompiledFilter,
    options: &PipelineOptions,
    sink: &dyn DiagnosticSink,
) -> Result<CountTable, PivotError>
where
    S: RecordSource + ?Sized,
{
    run_pipeline(source, filter, options, sink).map(|outcome| outcome.table)
}

/// Filters and aggregates a single in-memory batch.
pub fn process_batch(
    batch: &RecordBatch,
    filter: &CompiledFilter,
    sink: &dyn DiagnosticSink,
) -> Result<CountTable, PivotError> {
    let bound = BoundFilter::bind(batch.schema(), filter, sink)?;
    Ok(PartialPivot::from_chunk(&bound, batch, sink).finish(filter))
}

/// Processes consecutive chunks of one input and merges them.
///
/// Every chunk must share the first chunk's schema.
pub fn process_batches<I>(
    batches: I,
    filter: &CompiledFilter,
    sink: &dyn DiagnosticSink,
) -> Result<CountTable, PivotError>
where
    I: IntoIterator<Item = RecordBatch>,
{
    let mut batches = batches.into_iter();
    let first = match batches.next() {
        Some(batch) => batch,
        None => return Ok(CountTable::new()),
    };

    let schema = first.schema().clone();
    let bound = BoundFilter::bind(&schema, filter, sink)?;
    let mut running = PartialPivot::from_chunk(&bound, &first, sink);
    for batch in batches {
        ensure_schema(&batch, &schema)?;
        running = running.merge(PartialPivot::from_chunk(&bound, &batch, sink));
    }
    Ok(running.finish(filter))
}

fn ensure_schema(batch: &RecordBatch, schema: &engine::Schema) -> Result<(), PivotError> {
    if batch.schema() == schema {
        Ok(())
    } else {
        Err(PivotError::SchemaMismatch)
    }
}
