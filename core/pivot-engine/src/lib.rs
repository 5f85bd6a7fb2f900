//! FILENAME: core/pivot-engine/src/lib.rs
//! Count-pivot subsystem.
//!
//! Turns batches of string records into a frequency table keyed by a
//! `(main, secondary)` column pair, after exclusion/inclusion filtering. It
//! depends on `engine` only for the shared record model.
//!
//! Layers:
//! - `definition`: Serializable configuration (what to count, what to drop)
//! - `filter`: Row predicates compiled from the definition
//! - `cache`: The count table and its merge (HOW partial results combine)
//! - `engine`: Aggregation and the whole-file/chunked ingest driver
//! - `view`: Sorted, output-ready rows for the writer (WHAT we display)

pub mod cache;
pub mod definition;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod filter;
pub mod source;
pub mod view;

pub use cache::{merge, CountTable, PivotKey};
pub use definition::*;
pub use diagnostics::{
    CollectingDiagnostics, Diagnostic, DiagnosticLevel, DiagnosticSink, LogDiagnostics,
    NullDiagnostics,
};
pub use engine::{
    aggregate, process_batch, process_batches, process_source, route,
    run_pipeline, IngestRoute, PartialPivot, PivotOutcome, PivotStats,
};
pub use error::PivotError;
pub use filter::{filter_batch, BoundFilter, FilteredBatch};
pub use source::{MemorySource, RecordSource};
pub use view::{MergedSpan, PivotView, PivotViewRow};
