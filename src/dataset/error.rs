//! Error types for dataset construction and loading

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building or reading a dataset
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatasetError {
    /// A row has a different number of cells than the header
    #[error("Row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A record is missing a column present in the first record
    #[error("Row {row} is missing column '{column}'")]
    MissingColumn { row: usize, column: String },

    /// The same column name appears twice
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    /// A column name is empty or whitespace
    #[error("Column {0} has a blank name")]
    BlankColumnName(usize),

    /// CSV input could not be parsed
    #[error("CSV error: {0}")]
    Csv(String),

    /// Input file could not be read
    #[error("Failed to read {path}: {message}")]
    Io { path: PathBuf, message: String },
}

/// Result type for dataset operations
pub type DatasetResult<T> = Result<T, DatasetError>;

impl From<::csv::Error> for DatasetError {
    fn from(err: ::csv::Error) -> Self {
        DatasetError::Csv(err.to_string())
    }
}

impl DatasetError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            DatasetError::RaggedRow { .. } | DatasetError::MissingColumn { .. } => {
                format!(
                    "{self}\n\nHint: every row must have one value per header column. \
                    Check for unquoted delimiters in the file."
                )
            }
            DatasetError::DuplicateColumn(_) | DatasetError::BlankColumnName(_) => {
                format!("{self}\n\nHint: give every header column a unique, non-empty name.")
            }
            _ => self.to_string(),
        }
    }
}
