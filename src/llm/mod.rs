//! Language model access
//!
//! The pipeline talks to a model only through [`LlmClient`]. Two HTTP clients
//! are provided:
//!
//! - [`OllamaClient`] for a local Ollama server
//! - [`ChatCompletionsClient`] for OpenAI-compatible `/chat/completions`
//!   endpoints
//!
//! [`LlmConfig::build_client`] picks one from configuration.
//!
//! # Feature Flags
//!
//! - `llm-online` (default): enables the HTTP transport. Without it both
//!   clients return [`LlmError::FeatureNotAvailable`].

pub mod client;
pub mod config;
pub mod error;
pub mod ollama;
pub mod openai;

pub use client::LlmClient;
pub use config::{LlmConfig, LlmProvider};
pub use error::{LlmError, LlmResult};
pub use ollama::OllamaClient;
pub use openai::ChatCompletionsClient;

#[cfg(test)]
pub use client::MockLlmClient;
