//! Error types for LLM operations

use thiserror::Error;

/// Errors that can occur while talking to a language model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Failed to connect to LLM service
    #[error("Failed to connect to LLM service: {0}")]
    ConnectionError(String),

    /// Request timeout
    #[error("LLM request timed out after {0} seconds")]
    Timeout(u64),

    /// Credentials missing or rejected
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Rate limiting
    #[error("Rate limited by LLM service, retry after {0} seconds")]
    RateLimited(u64),

    /// Service answered with a non-success status
    #[error("API error {status}: {body}")]
    ApiError { status: u16, body: String },

    /// Response body did not have the expected shape
    #[error("Invalid LLM response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Feature not available
    #[error("LLM feature not available: {0}. Enable with --features {1}")]
    FeatureNotAvailable(String, String),
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::InvalidResponse(err.to_string())
    }
}

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

impl LlmError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            LlmError::ConnectionError(msg) => {
                format!(
                    "Failed to connect to LLM service: {msg}\n\n\
                    Hints:\n\
                    - Verify the API endpoint is correct (--url)\n\
                    - For Ollama: ensure 'ollama serve' is running"
                )
            }
            LlmError::Timeout(secs) => {
                format!(
                    "LLM request timed out after {secs} seconds.\n\n\
                    Hints:\n\
                    - The model may be overloaded, try again later\n\
                    - Increase timeout_seconds in the [llm] config section"
                )
            }
            LlmError::AuthenticationError(msg) => {
                format!(
                    "Authentication failed: {msg}\n\n\
                    Hint: Export the API key in the variable named by --api-key-env."
                )
            }
            LlmError::RateLimited(secs) => {
                format!(
                    "Rate limited by LLM service. Retry after {secs} seconds.\n\n\
                    Hint: Wait and try again, or use a different API key."
                )
            }
            LlmError::ConfigError(msg) => {
                format!(
                    "LLM configuration error: {msg}\n\n\
                    Hints:\n\
                    - Use --provider ollama for local models\n\
                    - Use --provider openai-compatible with --url for hosted endpoints"
                )
            }
            LlmError::FeatureNotAvailable(feature, flag) => {
                format!(
                    "LLM feature '{feature}' not available.\n\n\
                    Hint: Rebuild with --features {flag}"
                )
            }
            _ => self.to_string(),
        }
    }
}
