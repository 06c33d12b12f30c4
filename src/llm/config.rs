//! LLM provider configuration

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::client::LlmClient;
use super::error::{LlmError, LlmResult};
use super::ollama::OllamaClient;
use super::openai::ChatCompletionsClient;

/// Which wire protocol to use
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// Ollama `/api/generate`
    #[default]
    #[serde(rename = "ollama")]
    Ollama,
    /// OpenAI-compatible `/chat/completions`
    #[serde(rename = "openai-compatible")]
    OpenAiCompatible,
}

impl LlmProvider {
    /// Get the provider name as used in config files and flags
    pub fn name(&self) -> &'static str {
        match self {
            LlmProvider::Ollama => "ollama",
            LlmProvider::OpenAiCompatible => "openai-compatible",
        }
    }

    fn default_url(&self) -> &'static str {
        match self {
            LlmProvider::Ollama => "http://localhost:11434",
            LlmProvider::OpenAiCompatible => "https://api.openai.com/v1",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::Ollama => "llama3.2",
            LlmProvider::OpenAiCompatible => "gpt-4o-mini",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(LlmProvider::Ollama),
            "openai-compatible" | "openai" => Ok(LlmProvider::OpenAiCompatible),
            _ => Err(format!(
                "Unknown provider: {s}. Valid providers: ollama, openai-compatible"
            )),
        }
    }
}

/// Connection settings for the language model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    /// Wire protocol
    #[serde(default)]
    pub provider: LlmProvider,

    /// Base URL; provider default when absent
    #[serde(default)]
    pub url: Option<String>,

    /// Model name; provider default when absent
    #[serde(default)]
    pub model: Option<String>,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout_seconds() -> u64 {
    120
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            url: None,
            model: None,
            api_key_env: default_api_key_env(),
            timeout_seconds: default_timeout_seconds(),
            temperature: default_temperature(),
        }
    }
}

impl LlmConfig {
    /// Ollama on the default local port
    pub fn ollama(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            ..Default::default()
        }
    }

    /// An OpenAI-compatible endpoint
    pub fn openai_compatible(url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: LlmProvider::OpenAiCompatible,
            url: Some(url.into()),
            model: Some(model.into()),
            ..Default::default()
        }
    }

    /// Set the environment variable holding the API key
    pub fn with_api_key_env(mut self, var: impl Into<String>) -> Self {
        self.api_key_env = var.into();
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Effective base URL
    pub fn effective_url(&self) -> &str {
        self.url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_url())
    }

    /// Effective model name
    pub fn effective_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Validate the configuration
    pub fn validate(&self) -> LlmResult<()> {
        let url = self.effective_url();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(LlmError::ConfigError(format!(
                "URL must start with http:// or https://, got '{url}'"
            )));
        }
        if self.effective_model().trim().is_empty() {
            return Err(LlmError::ConfigError("Model name is empty".to_string()));
        }
        if self.timeout_seconds == 0 {
            return Err(LlmError::ConfigError(
                "timeout_seconds must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the configured client
    ///
    /// For OpenAI-compatible endpoints the key is read from `api_key_env`; a
    /// missing variable sends unauthenticated requests, which local servers
    /// accept.
    pub fn build_client(&self) -> LlmResult<Arc<dyn LlmClient>> {
        self.validate()?;

        let client: Arc<dyn LlmClient> = match self.provider {
            LlmProvider::Ollama => Arc::new(
                OllamaClient::new(self.effective_url(), self.effective_model())
                    .with_timeout(self.timeout_seconds)
                    .with_temperature(self.temperature),
            ),
            LlmProvider::OpenAiCompatible => {
                let mut client =
                    ChatCompletionsClient::new(self.effective_url(), self.effective_model())
                        .with_timeout(self.timeout_seconds)
                        .with_temperature(self.temperature);
                match std::env::var(&self.api_key_env) {
                    Ok(key) if !key.trim().is_empty() => client = client.with_api_key(key),
                    _ => warn!(
                        var = %self.api_key_env,
                        "API key variable not set, sending unauthenticated requests"
                    ),
                }
                Arc::new(client)
            }
        };

        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!("ollama".parse::<LlmProvider>().unwrap(), LlmProvider::Ollama);
        assert_eq!(
            "OpenAI-Compatible".parse::<LlmProvider>().unwrap(),
            LlmProvider::OpenAiCompatible
        );
        assert!("claude".parse::<LlmProvider>().is_err());
        assert_eq!(LlmProvider::OpenAiCompatible.to_string(), "openai-compatible");
    }

    #[test]
    fn test_defaults_per_provider() {
        let config = LlmConfig::default();
        assert_eq!(config.effective_url(), "http://localhost:11434");
        assert_eq!(config.effective_model(), "llama3.2");

        let config = LlmConfig {
            provider: LlmProvider::OpenAiCompatible,
            ..Default::default()
        };
        assert_eq!(config.effective_url(), "https://api.openai.com/v1");
    }

    #[test]
    fn test_deserialize_toml_style() {
        let json = r#"{"provider": "openai-compatible", "url": "http://localhost:8080/v1", "model": "qwen"}"#;
        let config: LlmConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.provider, LlmProvider::OpenAiCompatible);
        assert_eq!(config.effective_model(), "qwen");
        assert_eq!(config.timeout_seconds, 120);
        assert_eq!(config.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_validate() {
        assert!(LlmConfig::default().validate().is_ok());

        let config = LlmConfig::openai_compatible("ftp://nope", "m");
        assert!(matches!(config.validate(), Err(LlmError::ConfigError(_))));

        let config = LlmConfig::ollama("llama3.2").with_timeout(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_client() {
        let client = LlmConfig::ollama("mistral").build_client().unwrap();
        assert_eq!(client.model_name(), "mistral");

        let client = LlmConfig::openai_compatible("http://localhost:8080/v1", "qwen")
            .with_api_key_env("TABULAR_REPORT_TEST_UNSET_KEY")
            .build_client()
            .unwrap();
        assert_eq!(client.model_name(), "qwen");
    }
}
