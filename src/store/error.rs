//! Error types for the tabular store

use thiserror::Error;

/// Errors that can occur in the tabular store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Engine could not be opened
    #[error("Database error: {0}")]
    Database(String),

    /// Dataset could not be loaded into the table
    #[error("Failed to load dataset: {0}")]
    Load(String),

    /// Statement failed in the engine
    #[error("{0}")]
    Query(String),

    /// Statement was refused by the read-only guard
    #[error("Statement is not read-only ({0}); only queries are allowed")]
    NotReadOnly(String),

    /// Statement contained nothing to run
    #[error("Empty statement")]
    EmptyStatement,
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl From<duckdb::Error> for StoreError {
    fn from(err: duckdb::Error) -> Self {
        StoreError::Query(err.to_string())
    }
}
