//! Query execution against the full dataset

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::config::PipelineConfig;
use super::error::PipelineResult;
use super::planner::QuerySet;
use crate::dataset::Dataset;
use crate::store::{DuckDbStore, QueryOutput, TabularStore, ensure_read_only};

/// Outcome of one statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome {
    Rows(QueryOutput),
    Error { message: String },
}

/// One statement and what happened when it ran
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub statement: String,
    pub outcome: QueryOutcome,
}

impl QueryResult {
    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, QueryOutcome::Rows(_))
    }

    pub fn rows(&self) -> Option<&QueryOutput> {
        match &self.outcome {
            QueryOutcome::Rows(output) => Some(output),
            QueryOutcome::Error { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            QueryOutcome::Rows(_) => None,
            QueryOutcome::Error { message } => Some(message),
        }
    }
}

/// Runs planned statements one by one, capturing every failure
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    enforce_read_only: bool,
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

impl QueryExecutor {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            enforce_read_only: config.enforce_read_only,
        }
    }

    /// Load the dataset into a fresh store and run every statement
    ///
    /// The store lives only for this call. Only a store that cannot be opened
    /// or loaded is an error; statement failures are results.
    pub fn execute(&self, dataset: &Dataset, queries: &QuerySet) -> PipelineResult<Vec<QueryResult>> {
        let mut store = DuckDbStore::open_in_memory()?;
        self.execute_with(&mut store, dataset, queries)
    }

    /// Like [`execute`](Self::execute) with a caller-supplied store
    pub fn execute_with<S: TabularStore>(
        &self,
        store: &mut S,
        dataset: &Dataset,
        queries: &QuerySet,
    ) -> PipelineResult<Vec<QueryResult>> {
        let start = Instant::now();
        store.load(dataset)?;

        let mut results = Vec::with_capacity(queries.len());
        for (index, statement) in queries.iter().enumerate() {
            let outcome = match self.run_one(&*store, statement) {
                Ok(output) => {
                    debug!(query = index + 1, rows = output.row_count(), "Query succeeded");
                    QueryOutcome::Rows(output)
                }
                Err(message) => {
                    warn!(query = index + 1, error = %message, "Query failed");
                    QueryOutcome::Error { message }
                }
            };
            results.push(QueryResult {
                statement: statement.to_string(),
                outcome,
            });
        }

        info!(
            queries = results.len(),
            failed = results.iter().filter(|r| !r.is_ok()).count(),
            rows_loaded = dataset.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Queries executed"
        );

        Ok(results)
    }

    fn run_one<S: TabularStore>(&self, store: &S, statement: &str) -> Result<QueryOutput, String> {
        if self.enforce_read_only {
            ensure_read_only(statement).map_err(|e| e.to_string())?;
        }
        store.execute(statement).map_err(|e| e.to_string())
    }
}
