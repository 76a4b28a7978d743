//! Error taxonomy for the crate.
//!
//! Read-direction value conversion is deliberately lenient and never surfaces
//! here; everything that *does* surface is fatal for the call it came from
//! (see the individual variants). Underlying driver errors are carried as
//! opaque [`anyhow::Error`] sources.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RowlinkError>;

#[derive(Debug, Error)]
pub enum RowlinkError {
    /// The source/target is unreachable or rejected the credentials.
    /// Fatal for the adapter; never retried internally.
    #[error("connection failed: {0}")]
    ConnectionFailed(#[source] anyhow::Error),

    /// A row's value count disagrees with the table's column count.
    #[error("schema mismatch in table '{table}': row has {actual} values, table has {expected} columns")]
    SchemaMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    /// A required record field received a null value after conversion.
    /// Aborts that object's construction and propagates.
    #[error("required field '{field}' was null")]
    RequiredFieldNull { field: String },

    /// A value converter could not render a value for output.
    /// Aborts the current row's conversion.
    #[error("cannot convert '{value}' to {target} (culture '{culture}')")]
    ConversionFailed {
        value: String,
        target: String,
        culture: String,
    },

    /// The adapter or formatter is configured inconsistently
    /// (e.g. fixed-width read without field definitions).
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One provider-reported row failure inside a bulk write.
///
/// Collected per block and reported after the block commits or rolls back;
/// does not stop the remaining blocks in the stream.
#[derive(Debug, Clone)]
pub struct RowError {
    /// Index of the failing row within the block it was part of.
    pub row_index: usize,
    pub message: String,
}

/// Outcome of one bulk-written block.
#[derive(Debug, Clone, Default)]
pub struct BulkWriteReport {
    /// Rows actually committed.
    pub written: usize,
    /// Rows the provider rejected, for caller inspection.
    pub row_errors: Vec<RowError>,
}

impl BulkWriteReport {
    pub fn is_clean(&self) -> bool {
        self.row_errors.is_empty()
    }
}
