//! Error types for report runs
//!
//! A run fails only on input problems, model transport failures, configuration
//! problems, store construction failures and cancellation. Statement failures
//! are captured per query and never reach this type.

use thiserror::Error;

use super::state::RunState;
use crate::dataset::DatasetError;
use crate::llm::LlmError;
use crate::prompt::TemplateError;
use crate::store::StoreError;

/// Errors that end or reject a report run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Dataset has no rows
    #[error("Dataset is empty; nothing to report on")]
    EmptyDataset,

    /// Dataset could not be used
    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    /// Another run on the same pipeline has not finished
    #[error("A report run is already in progress")]
    RunInProgress,

    /// Language model call failed
    #[error("LLM call failed during {stage}: {source}")]
    Transport {
        stage: RunState,
        #[source]
        source: LlmError,
    },

    /// Prompt template missing from the library
    #[error("Prompt template not found: {0}")]
    TemplateNotFound(String),

    /// Store could not be opened or loaded
    #[error("Store error: {0}")]
    Store(String),

    /// Run cancelled by the caller
    #[error("Report run cancelled")]
    Cancelled,

    /// Run task ended without reporting an outcome
    #[error("Report run aborted unexpectedly")]
    Aborted,

    /// Pipeline configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Coarse classification of run failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any stage ran
    Input,
    /// Model call failed
    Transport,
    /// Templates, runtime or settings
    Configuration,
    /// Embedded engine could not be prepared
    Resource,
    /// Caller cancelled or the run vanished
    Cancelled,
}

impl PipelineError {
    /// Transport failure in a given stage
    pub fn transport(stage: RunState, source: LlmError) -> Self {
        Self::Transport { stage, source }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::EmptyDataset
            | PipelineError::InvalidDataset(_)
            | PipelineError::RunInProgress => ErrorKind::Input,
            PipelineError::Transport { .. } => ErrorKind::Transport,
            PipelineError::TemplateNotFound(_) | PipelineError::ConfigError(_) => {
                ErrorKind::Configuration
            }
            PipelineError::Store(_) => ErrorKind::Resource,
            PipelineError::Cancelled | PipelineError::Aborted => ErrorKind::Cancelled,
        }
    }

    /// Stage the failure happened in, for transport failures
    pub fn stage(&self) -> Option<RunState> {
        match self {
            PipelineError::Transport { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::EmptyDataset => {
                "The dataset has no rows.\n\nHint: Check that the input file has a header and at least one data row.".to_string()
            }
            PipelineError::RunInProgress => {
                "A report is already being generated. Wait for it to finish.".to_string()
            }
            PipelineError::Transport { stage, source } => {
                format!("{} failed.\n\n{}", stage.description(), source.user_message())
            }
            PipelineError::TemplateNotFound(name) => {
                format!(
                    "Prompt template '{name}' not found.\n\n\
                    Hint: Provide {name}.txt in --templates-dir, or run 'templates export' to start from the built-in set."
                )
            }
            PipelineError::Cancelled => "Report run cancelled.".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<DatasetError> for PipelineError {
    fn from(err: DatasetError) -> Self {
        PipelineError::InvalidDataset(err.to_string())
    }
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        PipelineError::Store(err.to_string())
    }
}

impl From<TemplateError> for PipelineError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::NotFound(name) => PipelineError::TemplateNotFound(name),
            other => PipelineError::ConfigError(other.to_string()),
        }
    }
}
