//! Configuration for the Anthropic Messages API client

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

/// Anthropic client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicConfig {
    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key (read from env ANTHROPIC_API_KEY if not set)
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// API version header
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Number of retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Base backoff in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: Option<f32>,
}

// Default value functions
fn default_base_url() -> String { "https://api.anthropic.com".to_string() }
fn default_model() -> String { "claude-sonnet-4-20250514".to_string() }
fn default_api_version() -> String { "2023-06-01".to_string() }
fn default_timeout_ms() -> u64 { 30_000 }
fn default_max_retries() -> usize { 2 }
fn default_retry_backoff_ms() -> u64 { 500 }

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            api_version: default_api_version(),
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: None,
        }
    }
}

impl AnthropicConfig {
    /// Fill unset values from environment variables
    pub fn from_env(mut self) -> Self {
        if self.api_key.is_none() {
            if let Ok(val) = std::env::var("ANTHROPIC_API_KEY") {
                if !val.trim().is_empty() {
                    self.api_key = Some(SecretString::new(val));
                }
            }
        }

        if let Ok(val) = std::env::var("ANTHROPIC_BASE_URL") {
            self.base_url = val;
        }

        if let Ok(val) = std::env::var("ANTHROPIC_MODEL") {
            self.model = val;
        }

        self
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get base backoff as Duration
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Messages endpoint URL
    pub fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }
}
