//! Tabular Report - analytical reports over tabular data
//!
//! Provides:
//! - Dataset loading and sampling
//! - An embedded SQL store holding the complete dataset
//! - LLM clients for local and hosted models
//! - Versioned prompt templates
//! - The plan / execute / synthesize report pipeline
//!
//! The model plans the analysis from a five-row sample and proposes SQL; the
//! SQL runs locally against every row; the model then writes an HTML report
//! from the computed results.

pub mod cli;
pub mod dataset;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod store;

// Re-export commonly used types
pub use dataset::{Dataset, DatasetError, Sample, project, read_csv_path, read_csv_str};
pub use llm::{LlmClient, LlmConfig, LlmError, LlmProvider};
pub use pipeline::{
    PipelineConfig, PipelineError, Report, ReportPipeline, RunHandle, RunState, RunSnapshot,
};
pub use prompt::{PromptTemplate, TemplateLibrary};
pub use store::{DuckDbStore, QueryOutput, StoreError, TabularStore};
