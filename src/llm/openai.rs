//! Client for OpenAI-compatible `/chat/completions` endpoints
//!
//! Works with hosted inference services and local servers that speak the same
//! protocol. The system instruction becomes a leading `system` message.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::client::LlmClient;
use super::error::{LlmError, LlmResult};

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default frequency penalty, discourages repeated phrasing in long reports
pub const DEFAULT_FREQUENCY_PENALTY: f32 = 0.3;

/// Chat-completions API client
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout_seconds: u64,
    temperature: f32,
    frequency_penalty: f32,
    max_tokens: Option<usize>,
    #[cfg(feature = "llm-online")]
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    frequency_penalty: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionsClient {
    /// Create a client for `base_url` (e.g. "https://api.openai.com/v1")
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
            timeout_seconds: 120,
            temperature: DEFAULT_TEMPERATURE,
            frequency_penalty: DEFAULT_FREQUENCY_PENALTY,
            max_tokens: None,
            #[cfg(feature = "llm-online")]
            client: reqwest::Client::new(),
        }
    }

    /// Send `Authorization: Bearer <key>` with every request
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Set the temperature for sampling
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    /// Set the frequency penalty
    pub fn with_frequency_penalty(mut self, penalty: f32) -> Self {
        self.frequency_penalty = penalty.clamp(-2.0, 2.0);
        self
    }

    /// Cap the completion length
    pub fn with_max_tokens(mut self, tokens: usize) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request<'a>(&'a self, prompt: &'a str, system: Option<&'a str>) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            frequency_penalty: self.frequency_penalty,
            max_tokens: self.max_tokens,
        }
    }
}

/// Map a non-success status and body to an error
fn status_error(status: u16, body: String) -> LlmError {
    match status {
        401 | 403 => LlmError::AuthenticationError(format!("HTTP {status}: {body}")),
        429 => LlmError::RateLimited(60),
        _ => LlmError::ApiError { status, body },
    }
}

fn first_content(response: ChatResponse) -> LlmResult<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| LlmError::InvalidResponse("No content in LLM response".to_string()))
}

#[cfg(feature = "llm-online")]
#[async_trait]
impl LlmClient for ChatCompletionsClient {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> LlmResult<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = self.build_request(prompt, system);

        tracing::debug!(url = %url, model = %self.model, "Sending chat completion request");

        let mut builder = self
            .client
            .post(&url)
            .json(&request)
            .timeout(std::time::Duration::from_secs(self.timeout_seconds));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(self.timeout_seconds)
            } else {
                LlmError::ConnectionError(format!("{}: {}", self.base_url, e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), body));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        first_content(chat)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn is_ready(&self) -> bool {
        let mut builder = self
            .client
            .get(format!("{}/models", self.base_url))
            .timeout(std::time::Duration::from_secs(10));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

#[cfg(not(feature = "llm-online"))]
#[async_trait]
impl LlmClient for ChatCompletionsClient {
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
