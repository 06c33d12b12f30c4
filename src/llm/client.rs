//! LLM client trait
//!
//! The pipeline only needs "given a prompt and an optional system instruction,
//! return text or fail". Everything about transport, authentication and model
//! selection stays behind this trait.

use async_trait::async_trait;

use super::error::LlmResult;

/// Trait for LLM client implementations
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a completion for the given prompt
    ///
    /// # Arguments
    /// * `prompt` - The input prompt for the LLM
    /// * `system` - Optional system instruction sent alongside the prompt
    ///
    /// # Returns
    /// The generated text response
    async fn complete(&self, prompt: &str, system: Option<&str>) -> LlmResult<String>;

    /// Get the model name being used
    fn model_name(&self) -> &str;

    /// Check if the client is ready and connected
    async fn is_ready(&self) -> bool;
}

/// A scripted LLM client for unit tests
///
/// Replies are handed out in order; every call is recorded.
#[cfg(test)]
pub struct MockLlmClient {
    replies: std::sync::Mutex<std::collections::VecDeque<LlmResult<String>>>,
    calls: std::sync::Mutex<Vec<(String, Option<String>)>>,
}

#[cfg(test)]
impl MockLlmClient {
    /// Create a client that answers with the given replies in order
    pub fn new(replies: Vec<LlmResult<String>>) -> Self {
        Self {
            replies: std::sync::Mutex::new(replies.into()),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Create a client that answers every call with the same text
    pub fn replying(reply: impl Into<String>) -> Self {
        Self::new(vec![Ok(reply.into())])
    }

    /// Recorded `(prompt, system)` pairs
    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> LlmResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), system.map(str::to_string)));

        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.pop_front().unwrap()
        } else {
            replies.front().cloned().unwrap_or_else(|| {
                Err(super::error::LlmError::InvalidResponse(
                    "no scripted reply".to_string(),
                ))
            })
        }
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }

    async fn is_ready(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmError;

    #[tokio::test]
    async fn test_mock_client_replies_in_order() {
        let client = MockLlmClient::new(vec![Ok("first".to_string()), Ok("second".to_string())]);
        assert!(client.is_ready().await);
        assert_eq!(client.model_name(), "mock-model");

        assert_eq!(client.complete("a", None).await.unwrap(), "first");
        assert_eq!(client.complete("b", Some("sys")).await.unwrap(), "second");
        // Last reply repeats
        assert_eq!(client.complete("c", None).await.unwrap(), "second");

        let calls = client.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1], ("b".to_string(), Some("sys".to_string())));
    }

    #[tokio::test]
    async fn test_mock_client_failure() {
        let client = MockLlmClient::new(vec![Err(LlmError::Timeout(5))]);
        let result = client.complete("prompt", None).await;
        assert_eq!(result.unwrap_err(), LlmError::Timeout(5));
    }
}
