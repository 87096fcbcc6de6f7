//! Text-generation collaborator
//!
//! The summarizer and classifier depend only on the [`TextGenerator`] trait.
//! A concrete client is constructed once at startup and injected as
//! `Arc<dyn TextGenerator>`:
//! - `generate` - free-text completion
//! - `generate_structured` - schema-constrained JSON object

pub mod anthropic_client;
pub mod anthropic_config;
pub mod models;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use anthropic_client::AnthropicClient;
pub use anthropic_config::AnthropicConfig;

/// External text-generation service
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate free text for a prompt
    async fn generate(&self, prompt: &str, max_output_tokens: u32) -> Result<String, CollaboratorError>;

    /// Generate a JSON object conforming to `schema`
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &OutputSchema,
        max_output_tokens: u32,
    ) -> Result<serde_json::Value, CollaboratorError>;
}

/// Named JSON schema for structured output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSchema {
    pub name: String,
    pub description: String,
    pub schema: serde_json::Value,
}

/// Collaborator errors
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl CollaboratorError {
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            CollaboratorError::RateLimited(_)
            | CollaboratorError::Timeout(_)
            | CollaboratorError::Network(_) => true,
            CollaboratorError::Api { status, .. } => *status >= 500,
            CollaboratorError::Initialization(_) | CollaboratorError::MalformedResponse(_) => false,
        }
    }

    /// Short label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            CollaboratorError::Initialization(_) => "initialization",
            CollaboratorError::Api { .. } => "api",
            CollaboratorError::RateLimited(_) => "rate_limited",
            CollaboratorError::Timeout(_) => "timeout",
            CollaboratorError::Network(_) => "network",
            CollaboratorError::MalformedResponse(_) => "malformed",
        }
    }
}
