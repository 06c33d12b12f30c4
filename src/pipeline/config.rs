//! Pipeline configuration

use serde::{Deserialize, Serialize};

/// Settings for report runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Refuse planned statements that would modify data or schema
    #[serde(default = "default_enforce_read_only")]
    pub enforce_read_only: bool,
}

fn default_enforce_read_only() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enforce_read_only: default_enforce_read_only(),
        }
    }
}

impl PipelineConfig {
    /// Create a new pipeline config
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the read-only statement guard
    pub fn with_enforce_read_only(mut self, enforce: bool) -> Self {
        self.enforce_read_only = enforce;
        self
    }
}
