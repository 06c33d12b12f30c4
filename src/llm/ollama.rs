//! Ollama API client
//!
//! Talks to a locally hosted Ollama server through `/api/generate`. The system
//! instruction, when given, is sent in the request's `system` field.
//!
//! # Example
//!
//! ```ignore
//! use tabular_report::llm::{LlmClient, OllamaClient};
//!
//! let client = OllamaClient::new("http://localhost:11434", "llama3.2")
//!     .with_timeout(60);
//!
//! let response = client.complete("Describe this table...", None).await?;
//! ```

use async_trait::async_trait;
#[cfg(any(feature = "llm-online", test))]
use serde::{Deserialize, Serialize};

use super::client::LlmClient;
use super::error::{LlmError, LlmResult};

/// Ollama API client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    /// Base URL of the Ollama API
    base_url: String,
    /// Model name to use
    model: String,
    /// Request timeout in seconds
    timeout_seconds: u64,
    /// Context window requested from the server
    max_context_tokens: usize,
    /// Temperature for sampling
    temperature: f32,
    #[cfg(feature = "llm-online")]
    client: reqwest::Client,
}

#[cfg(any(feature = "llm-online", test))]
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    options: GenerateOptions,
}

#[cfg(any(feature = "llm-online", test))]
#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_ctx: usize,
}

#[cfg(any(feature = "llm-online", test))]
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    total_duration: Option<u64>,
    #[serde(default)]
    prompt_eval_count: Option<usize>,
    #[serde(default)]
    eval_count: Option<usize>,
}

#[cfg(feature = "llm-online")]
#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[cfg(feature = "llm-online")]
#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

impl OllamaClient {
    /// Create a new Ollama client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the Ollama API (e.g., "http://localhost:11434")
    /// * `model` - Model name to use (e.g., "llama3.2", "mistral")
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout_seconds: 120,
            max_context_tokens: 8192,
            temperature: 0.7,
            #[cfg(feature = "llm-online")]
            client: reqwest::Client::new(),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Set the context window size
    pub fn with_max_context(mut self, tokens: usize) -> Self {
        self.max_context_tokens = tokens;
        self
    }

    /// Set the temperature for sampling
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List available models on the Ollama server
    #[cfg(feature = "llm-online")]
    pub async fn list_models(&self) -> LlmResult<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| LlmError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LlmError::ConnectionError(format!(
                "Failed to list models: HTTP {}",
                response.status()
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// List available models (stub for when feature is disabled)
    #[cfg(not(feature = "llm-online"))]
    pub async fn list_models(&self) -> LlmResult<Vec<String>> {
        Err(LlmError::FeatureNotAvailable(
            "Online LLM".to_string(),
            "llm-online".to_string(),
        ))
    }
}

#[cfg(feature = "llm-online")]
#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> LlmResult<String> {
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            model: &self.model,
            prompt,
            system,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                num_ctx: self.max_context_tokens,
            },
        };

        tracing::debug!(url = %url, model = %self.model, "Sending request to Ollama");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .timeout(std::time::Duration::from_secs(self.timeout_seconds))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.timeout_seconds)
                } else if e.is_connect() {
                    LlmError::ConnectionError(format!(
                        "Failed to connect to Ollama at {}: {}",
                        self.base_url, e
                    ))
                } else {
                    LlmError::ConnectionError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == 429 {
                return Err(LlmError::RateLimited(60));
            }
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let gen_response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        if let Some(duration) = gen_response.total_duration {
            tracing::debug!(
                duration_ms = duration / 1_000_000,
                prompt_tokens = gen_response.prompt_eval_count.unwrap_or(0),
                completion_tokens = gen_response.eval_count.unwrap_or(0),
                "Ollama completion finished"
            );
        }

        Ok(gen_response.response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn is_ready(&self) -> bool {
        self.list_models()
            .await
            .map(|models| models.iter().any(|m| m.starts_with(&self.model)))
            .unwrap_or(false)
    }
}

#[cfg(not(feature = "llm-online"))]
#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, _prompt: &str, _system: Option<&str>) -> LlmResult<String> {
        Err(LlmError::FeatureNotAvailable(
            "Online LLM".to_string(),
            "llm-online".to_string(),
        ))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn is_ready(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_client_new() {
        let client = OllamaClient::new("http://localhost:11434/", "llama3.2");
        assert_eq!(client.base_url(), "http://localhost:11434");
        assert_eq!(client.model_name(), "llama3.2");
    }

    #[test]
    fn test_ollama_client_builder() {
        let client = OllamaClient::new("http://remote:11434", "mistral")
            .with_timeout(60)
            .with_max_context(4096)
            .with_temperature(5.0);

        assert_eq!(client.timeout_seconds, 60);
        assert_eq!(client.max_context_tokens, 4096);
        assert!((client.temperature - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_generate_request_carries_system() {
        let request = GenerateRequest {
            model: "llama3.2",
            prompt: "Summarize",
            system: Some("Output HTML"),
            stream: false,
            options: GenerateOptions {
                temperature: 0.7,
                num_ctx: 8192,
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["system"], "Output HTML");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_ctx"], 8192);
    }

    #[test]
    fn test_generate_request_omits_missing_system() {
        let request = GenerateRequest {
            model: "llama3.2",
            prompt: "Plan",
            system: None,
            stream: false,
            options: GenerateOptions {
                temperature: 0.7,
                num_ctx: 8192,
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("system").is_none());
    }

    #[test]
    fn test_generate_response_minimal() {
        let json = r#"{"response": "Text", "done": true}"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.response, "Text");
        assert!(response.total_duration.is_none());
    }
}
