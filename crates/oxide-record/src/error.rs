//! Error types for the record layer.

use oxide_record_core::{AdapterError, QueryError};
use thiserror::Error;

/// Errors raised by resources and active records.
#[derive(Debug, Error)]
pub enum RecordError {
    /// A model or connection is misconfigured (missing table, unknown engine,
    /// unregistered model).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Invalid input to a builder operation.
    #[error("validation error: {0}")]
    Validation(String),

    /// `load` was called without an id on an entity that has none.
    #[error("no identifier given and the entity has no primary key value")]
    MissingIdentifier,

    /// The operation requires a loaded entity.
    #[error("entity is not loaded")]
    NotLoaded,

    /// No row matched the identifier.
    #[error("object not found")]
    NotFound,

    /// More than one row matched when exactly one was expected.
    #[error("{0} rows returned when one was expected")]
    MultipleRows(usize),

    /// A write statement failed and its transaction was rolled back.
    #[error("write failed: {source}")]
    Write {
        /// The adapter failure.
        #[source]
        source: AdapterError,
    },

    /// Adapter failure outside a write.
    #[error("adapter error: {0}")]
    Adapter(#[from] AdapterError),
}

impl From<QueryError> for RecordError {
    fn from(error: QueryError) -> Self {
        Self::Validation(error.to_string())
    }
}

/// Result type alias for record operations.
pub type Result<T> = std::result::Result<T, RecordError>;
