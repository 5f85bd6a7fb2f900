//! FILENAME: core/persistence/src/csv_reader.rs
//! CSV Record Source - streams a delimited export as record batches.
//!
//! The first record is the header row. Ragged rows are accepted: short rows are
//! padded with empty values. Extra fields on long rows are dropped with a warning.

use crate::PersistenceError;
use csv::{Reader, ReaderBuilder, StringRecord};
use engine::{RecordBatch, Schema};
use log::{debug, warn};
use pivot_engine::{PivotError, RecordSource};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Upper bound on rows reserved up front for one batch.
const BATCH_RESERVE: usize = 8192;

const BOM: char = '\u{feff}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions { delimiter: b',' }
    }
}

pub struct CsvRecordSource<R: Read> {
    reader: Reader<R>,
    schema: Schema,
    size_hint: Option<u64>,
    record: StringRecord,
    rows_read: usize,
    truncated_rows: usize,
}

impl CsvRecordSource<File> {
    /// Opens a file. Its size on disk becomes the size hint.
    pub fn open(path: &Path, options: &CsvOptions) -> Result<Self, PersistenceError> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        Ok(Self::from_reader(file, options)?.with_size_hint(size))
    }
}

impl<R: Read> CsvRecordSource<R> {
    /// Reads the header row. Fails with `EmptyInput` when there is none.
    pub fn from_reader(input: R, options: &CsvOptions) -> Result<Self, PersistenceError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(options.delimiter)
            .from_reader(input);

        let headers = reader.headers()?;
        if headers.is_empty() {
            return Err(PersistenceError::EmptyInput);
        }
        let schema = Schema::new(header_names(headers));

        Ok(CsvRecordSource {
            reader,
            schema,
            size_hint: None,
            record: StringRecord::new(),
            rows_read: 0,
            truncated_rows: 0,
        })
    }

    pub fn with_size_hint(mut self, bytes: u64) -> Self {
        self.size_hint = Some(bytes);
        self
    }

    /// Data rows read so far.
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// Rows that had more fields than the header and lost the extra ones.
    pub fn truncated_rows(&self) -> usize {
        self.truncated_rows
    }
}

impl<R: Read> RecordSource for CsvRecordSource<R> {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn size_hint_bytes(&self) -> Option<u64> {
        self.size_hint
    }

    fn next_batch(&mut self, max_rows: usize) -> Result<Option<RecordBatch>, PivotError> {
        let max_rows = max_rows.max(1);
        let mut batch = RecordBatch::with_capacity(self.schema.clone(), max_rows.min(BATCH_RESERVE));

        while batch.len() < max_rows {
            let more = self
                .reader
                .read_record(&mut self.record)
                .map_err(PivotError::from_source)?;
            if !more {
                break;
            }
            if self.record.len() > self.schema.len() {
                self.truncated_rows += 1;
                warn!(
                    "[CSV] line {}: {} fields for {} columns, extra fields dropped",
                    self.record.position().map_or(0, |p| p.line()),
                    self.record.len(),
                    self.schema.len()
                );
            }
            batch.push_record(self.record.iter().map(str::to_string).collect());
        }

        if batch.is_empty() {
            return Ok(None);
        }
        self.rows_read += batch.len();
        debug!(
            "[CSV] read {} rows ({} total)",
            batch.len(),
            self.rows_read
        );
        Ok(Some(batch))
    }
}

/// Header names with a leading byte-order mark removed and duplicates made
/// unique by suffixing `.1`, `.2`, ...
fn header_names(headers: &StringRecord) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(headers.len());
    for (i, raw) in headers.iter().enumerate() {
        let name = if i == 0 {
            raw.trim_start_matches(BOM)
        } else {
            raw
        };

        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
            continue;
        }
        let mut suffix = 1;
        loop {
            let candidate = format!("{}.{}", name, suffix);
            if !names.contains(&candidate) {
                names.push(candidate);
                break;
            }
            suffix += 1;
        }
    }
    names
}
