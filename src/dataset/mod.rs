//! Tabular dataset model
//!
//! A [`Dataset`] is an immutable, ordered sequence of rows sharing one column
//! set. Column order is taken from the header (or the first record) and is the
//! canonical order for rendering and for the table loaded into the store.
//!
//! # Example
//!
//! ```rust
//! use tabular_report::dataset::{Dataset, project};
//!
//! let dataset = Dataset::new(
//!     vec!["id".to_string(), "amount".to_string()],
//!     vec![
//!         vec!["1".to_string(), "10.5".to_string()],
//!         vec!["2".to_string(), "3".to_string()],
//!     ],
//! )
//! .unwrap();
//!
//! let sample = project(&dataset);
//! assert_eq!(sample.total_rows, 2);
//! ```

pub mod csv;
mod error;
mod sample;

pub use self::csv::{read_csv_path, read_csv_str};
pub use error::{DatasetError, DatasetResult};
pub use sample::{SAMPLE_SIZE, Sample, project};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// An ordered, immutable table of string cells
///
/// Deserialization goes through [`Dataset::new`], so the same checks apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDataset")]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Create a dataset from a header and rows of cells in header order
    ///
    /// Every row must have exactly one cell per column, and column names must
    /// be unique and non-blank.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> DatasetResult<Self> {
        validate_columns(&columns)?;

        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(DatasetError::RaggedRow {
                    row: index,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
        }

        Ok(Self { columns, rows })
    }

    /// Create a dataset from ordered `(column, value)` records
    ///
    /// Column order is taken from the first record. Every later record must
    /// carry the same column set, in any order.
    pub fn from_records<I, R, K, V>(records: I) -> DatasetResult<Self>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut columns: Vec<String> = Vec::new();
        let mut rows = Vec::new();

        for (index, record) in records.into_iter().enumerate() {
            let pairs: Vec<(String, String)> = record
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect();

            if index == 0 {
                columns = pairs.iter().map(|(k, _)| k.clone()).collect();
                validate_columns(&columns)?;
            }

            if pairs.len() != columns.len() {
                return Err(DatasetError::RaggedRow {
                    row: index,
                    expected: columns.len(),
                    found: pairs.len(),
                });
            }

            let mut cells = Vec::with_capacity(columns.len());
            for column in &columns {
                let value = pairs
                    .iter()
                    .find(|(k, _)| k == column)
                    .map(|(_, v)| v.clone())
                    .ok_or_else(|| DatasetError::MissingColumn {
                        row: index,
                        column: column.clone(),
                    })?;
                cells.push(value);
            }
            rows.push(cells);
        }

        Ok(Self { columns, rows })
    }

    /// Column names in canonical order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw cell rows in column order
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Borrow a single row
    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|cells| Row {
            columns: &self.columns,
            cells,
        })
    }

    /// Iterate rows as column-addressable views
    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|cells| Row {
            columns: &self.columns,
            cells,
        })
    }
}

/// A borrowed view of one dataset row
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    cells: &'a [String],
}

impl<'a> Row<'a> {
    /// Cell value for a column name
    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.cells[i].as_str())
    }

    /// Cells in column order
    pub fn cells(&self) -> &'a [String] {
        self.cells
    }

    /// `(column, value)` pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.columns
            .iter()
            .zip(self.cells.iter())
            .map(|(c, v)| (c.as_str(), v.as_str()))
    }
}

/// Unchecked wire form of a [`Dataset`]
#[derive(Deserialize)]
struct RawDataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TryFrom<RawDataset> for Dataset {
    type Error = DatasetError;

    fn try_from(raw: RawDataset) -> DatasetResult<Self> {
        Dataset::new(raw.columns, raw.rows)
    }
}

fn validate_columns(columns: &[String]) -> DatasetResult<()> {
    let mut seen = HashSet::with_capacity(columns.len());
    for (index, column) in columns.iter().enumerate() {
        if column.trim().is_empty() {
            return Err(DatasetError::BlankColumnName(index));
        }
        if !seen.insert(column.as_str()) {
            return Err(DatasetError::DuplicateColumn(column.clone()));
        }
    }
    Ok(())
}
