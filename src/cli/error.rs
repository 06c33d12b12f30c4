//! CLI error types

use std::path::PathBuf;

use thiserror::Error;

use crate::dataset::DatasetError;
use crate::llm::LlmError;
use crate::pipeline::PipelineError;
use crate::prompt::TemplateError;

/// Errors surfaced by CLI commands
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to read {0}: {1}")]
    FileReadError(PathBuf, String),

    #[error("Failed to write {0}: {1}")]
    FileWriteError(PathBuf, String),

    #[error("Invalid configuration file {0}: {1}")]
    ConfigError(PathBuf, String),

    #[error("Dataset error: {0}")]
    DatasetError(#[from] DatasetError),

    #[error("Template error: {0}")]
    TemplateError(#[from] TemplateError),

    #[error("LLM error: {0}")]
    LlmError(#[from] LlmError),

    #[error("{0}")]
    PipelineError(#[from] PipelineError),
}

impl CliError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            CliError::DatasetError(e) => e.user_message(),
            CliError::LlmError(e) => e.user_message(),
            CliError::PipelineError(e) => e.user_message(),
            _ => self.to_string(),
        }
    }
}
