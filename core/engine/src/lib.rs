//! FILENAME: core/engine/src/lib.rs
//! PURPOSE: Main library entry point for the record model.
//! CONTEXT: Re-exports the row/batch types shared by the pivot engine and the
//! persistence layer.

pub mod record;

// Re-export commonly used types at the crate root
pub use record::{ColumnIndex, RecordBatch, Row, Schema};
