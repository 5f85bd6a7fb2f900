//! FILENAME: core/persistence/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX write error: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("Pivot error: {0}")]
    Pivot(#[from] pivot_engine::PivotError),

    #[error("Input has no header row")]
    EmptyInput,

    #[error("Table has {0} rows, more than a worksheet can hold")]
    TooManyRows(usize),
}
