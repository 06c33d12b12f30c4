//! The report pipeline
//!
//! A run turns a [`Dataset`](crate::dataset::Dataset) into an HTML report in
//! three stages:
//!
//! 1. **Planning**: the model sees a sample and answers with a blueprint plus
//!    SQL ([`BlueprintPlanner`])
//! 2. **Executing**: the SQL runs against the complete dataset in a fresh
//!    store ([`QueryExecutor`])
//! 3. **Synthesizing**: the model turns the blueprint and results into one
//!    document ([`ReportSynthesizer`])
//!
//! [`ReportPipeline`] sequences the stages and is the only type most callers
//! need.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tabular_report::dataset::read_csv_path;
//! use tabular_report::llm::LlmConfig;
//! use tabular_report::pipeline::ReportPipeline;
//!
//! let dataset = Arc::new(read_csv_path("sales.csv".as_ref())?);
//! let client = LlmConfig::ollama("llama3.2").build_client()?;
//!
//! let handle = ReportPipeline::new(client).start_run(dataset);
//! let report = handle.wait().await?;
//! std::fs::write("report.html", report.html())?;
//! ```

mod config;
mod error;
mod extract;
mod orchestrator;
mod planner;
mod query;
mod state;
mod synthesizer;

pub use config::PipelineConfig;
pub use error::{ErrorKind, PipelineError, PipelineResult};
pub use extract::{Extraction, extract_document, extract_queries};
pub use orchestrator::{ReportPipeline, RunHandle};
pub use planner::{BlueprintPlanner, Plan, QuerySet};
pub use query::{QueryExecutor, QueryOutcome, QueryResult};
pub use state::{
    FAILURE_STEP, FINALIZING_PERCENT, FINALIZING_STEP, Progress, RunSnapshot, RunState,
};
pub use synthesizer::{NO_QUERIES_LINE, Report, ReportSynthesizer, render_results};
