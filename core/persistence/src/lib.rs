//! FILENAME: core/persistence/src/lib.rs
//! Persistence Module
//!
//! Reads delimited exports as record batches and writes count tables to XLSX.

mod csv_reader;
mod error;
mod xlsx_writer;

pub use csv_reader::{CsvOptions, CsvRecordSource};
pub use error::PersistenceError;
pub use xlsx_writer::{save_pivot_xlsx, XLSX_MAX_ROWS};

use pivot_engine::{run_pipeline, CompiledFilter, DiagnosticSink, PipelineOptions, PivotOutcome};
use std::path::Path;

/// Builds the count table of one CSV file.
///
/// The file size picks the ingest route: small files are read at once, large
/// ones are streamed in `options.chunk_rows` chunks.
pub fn pivot_csv_file(
    path: &Path,
    filter: &CompiledFilter,
    options: &PipelineOptions,
    csv_options: &CsvOptions,
    sink: &dyn DiagnosticSink,
) -> Result<PivotOutcome, PersistenceError> {
    let mut source = CsvRecordSource::open(path, csv_options)?;
    Ok(run_pipeline(&mut source, filter, options, sink)?)
}
