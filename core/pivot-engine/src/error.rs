//! FILENAME: core/pivot-engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PivotError {
    #[error("Invalid pattern for {field} ({pattern:?}): {source}")]
    InvalidPattern {
        field: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Required column not found: {0}")]
    MissingColumn(String),

    #[error("Batch schema does not match the schema the filter was bound to")]
    SchemaMismatch,

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Record source error: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl PivotError {
    /// Wraps an error raised by a record source (I/O, CSV decoding, ...).
    pub fn from_source<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PivotError::Source(Box::new(error))
    }
}
