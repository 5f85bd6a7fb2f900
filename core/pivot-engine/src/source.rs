//! FILENAME: core/pivot-engine/src/source.rs
//! Record sources feeding the pipeline.

use engine::{RecordBatch, Schema};

use crate::error::PivotError;

/// A stream of records delivered in batches.
///
/// All batches from one source share the schema returned by `schema()`.
pub trait RecordSource {
    fn schema(&self) -> &Schema;

    /// Size of the underlying input in bytes, when known. Drives the ingest route.
    fn size_hint_bytes(&self) -> Option<u64>;

    /// Reads up to `max_rows` records. `Ok(None)` once the source is exhausted.
    fn next_batch(&mut self, max_rows: usize) -> Result<Option<RecordBatch>, PivotError>;
}

/// Serves an in-memory batch, optionally pretending to be a file of a given size.
#[derive(Debug, Clone)]
pub struct MemorySource {
    batch: RecordBatch,
    position: usize,
    size_hint: Option<u64>,
}

impl MemorySource {
    pub fn new(batch: RecordBatch) -> Self {
        MemorySource {
            batch,
            position: 0,
            size_hint: None,
        }
    }

    pub fn with_size_hint(mut self, bytes: u64) -> Self {
        self.size_hint = Some(bytes);
        self
    }
}

impl RecordSource for MemorySource {
    fn schema(&self) -> &Schema {
        self.batch.schema()
    }

    fn size_hint_bytes(&self) -> Option<u64> {
        self.size_hint
    }

    fn next_batch(&mut self, max_rows: usize) -> Result<Option<RecordBatch>, PivotError> {
        if self.position >= self.batch.len() {
            return Ok(None);
        }
        let end = self.batch.len().min(self.position.saturating_add(max_rows.max(1)));
        let indices: Vec<usize> = (self.position..end).collect();
        self.position = end;
        Ok(Some(self.batch.select(&indices)))
    }
}
