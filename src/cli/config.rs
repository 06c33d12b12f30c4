//! Configuration file for the `generate` command
//!
//! ```toml
//! templates_dir = "prompts"
//!
//! [llm]
//! provider = "openai-compatible"
//! url = "http://localhost:8080/v1"
//! model = "qwen2.5"
//! api_key_env = "LLM_API_KEY"
//!
//! [pipeline]
//! enforce_read_only = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::CliError;
use crate::llm::LlmConfig;
use crate::pipeline::PipelineConfig;

/// Settings read from a TOML file; command-line flags override them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub llm: LlmConfig,
    pub pipeline: PipelineConfig,
    /// Directory of `<name>.txt` prompt templates overlaying the built-ins
    pub templates_dir: Option<PathBuf>,
}

impl ReportConfig {
    /// Parse configuration text
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, CliError> {
        toml::from_str(text).map_err(|e| CliError::ConfigError(origin.to_path_buf(), e.to_string()))
    }

    /// Read and parse a configuration file
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CliError::FileReadError(path.to_path_buf(), e.to_string()))?;
        Self::from_toml(&text, path)
    }
}
