//! Tabular store: the queryable, in-memory copy of a dataset
//!
//! A store holds exactly one table, [`TABLE_NAME`], containing the complete
//! dataset. Loading replaces whatever was there before. Statements run one at
//! a time and their failures come back as values.

mod engine;
mod error;
mod guard;
mod value;

pub use engine::DuckDbStore;
pub use error::{StoreError, StoreResult};
pub use guard::{ensure_read_only, split_statements};
pub use value::ColumnType;

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;

/// Logical name of the table every statement runs against
pub const TABLE_NAME: &str = "data";

/// Rows produced by one statement
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryOutput {
    /// Result column names in select order
    pub columns: Vec<String>,
    /// One JSON object per row, keys in column order
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl QueryOutput {
    /// Number of rows returned
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Rows as a pretty-printed JSON array
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.rows).unwrap_or_else(|_| "[]".to_string())
    }
}

/// A queryable single-table store
pub trait TabularStore {
    /// Replace the loaded table with the given dataset
    fn load(&mut self, dataset: &Dataset) -> StoreResult<()>;

    /// Run one statement against the loaded table
    fn execute(&self, statement: &str) -> StoreResult<QueryOutput>;
}
