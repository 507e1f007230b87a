//! Error types for the packaging pipeline

use thiserror::Error;

/// Everything that can abort a packaging run.
///
/// A run either produces all derived tables or fails with one of these
/// before any of them is surfaced.
#[derive(Error, Debug)]
pub enum PackagingError {
    /// Package count outside the supported range, or nothing left to cluster.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// An input row (or the header, row 0) does not match the component schema.
    #[error("inconsistent schema (row {row}): {message}")]
    InconsistentSchema { row: usize, message: String },

    #[error("unsupported input format: {0} (expected .xlsx, .xls, .ods or .csv)")]
    UnsupportedFormat(String),

    #[error("clustering failed: {0}")]
    Clustering(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl PackagingError {
    pub(crate) fn schema(row: usize, message: impl Into<String>) -> Self {
        Self::InconsistentSchema {
            row,
            message: message.into(),
        }
    }
}

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, PackagingError>;
