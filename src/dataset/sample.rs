//! Sample projection used to brief the model

use serde::{Deserialize, Serialize};

use super::Dataset;
use super::csv::write_csv;
use super::error::DatasetResult;

/// Number of leading rows shown to the model
pub const SAMPLE_SIZE: usize = 5;

/// The first rows of a dataset plus its full shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// All column names of the dataset
    pub columns: Vec<String>,
    /// Up to [`SAMPLE_SIZE`] rows, in original order
    pub rows: Vec<Vec<String>>,
    /// Row count of the whole dataset
    pub total_rows: usize,
}

/// Take the first [`SAMPLE_SIZE`] rows of a dataset
///
/// Pure and deterministic: no random sampling.
pub fn project(dataset: &Dataset) -> Sample {
    Sample {
        columns: dataset.columns().to_vec(),
        rows: dataset.rows().iter().take(SAMPLE_SIZE).cloned().collect(),
        total_rows: dataset.len(),
    }
}

impl Sample {
    /// Shape summary: total rows and column list
    pub fn metadata(&self) -> String {
        format!(
            "Total rows: {}\nColumns: {}",
            self.total_rows,
            self.columns.join(", ")
        )
    }

    /// Sample rows rendered as CSV with a header
    pub fn to_csv(&self) -> DatasetResult<String> {
        write_csv(&self.columns, &self.rows)
    }
}
