//! Service configuration
//!
//! Loaded from an optional TOML file and overridden by `MEMORA__SECTION__KEY`
//! environment variables, e.g. `MEMORA__SERVER__PORT=9000`.

use crate::classify::ClassifierConfig;
use crate::error::{MemoraError, Result};
use crate::llm::AnthropicConfig;
use crate::summary::SummarizerConfig;
use serde::Deserialize;

pub use crate::classify::QueueConfig;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: AnthropicConfig,

    #[serde(default)]
    pub summary: SummarizerConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request body limit in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Longest memo accepted, in characters
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,

    /// Upper bound for a requested summary length
    #[serde(default = "default_max_summary_length")]
    pub max_summary_length: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_max_content_chars() -> usize {
    50_000
}

fn default_max_summary_length() -> usize {
    2_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            max_content_chars: default_max_content_chars(),
            max_summary_length: default_max_summary_length(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging output
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    /// Load configuration from a file (optional) and the environment
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("MEMORA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        self.summary.budget.validate()?;

        if self.summary.default_max_length == 0 || self.summary.aggregate_max_length == 0 {
            return Err(MemoraError::Configuration(
                "summary lengths must be at least 1".to_string(),
            ));
        }
        if self.classifier.max_input_tokens == 0 {
            return Err(MemoraError::Configuration(
                "classifier.max_input_tokens must be at least 1".to_string(),
            ));
        }
        if self.queue.capacity == 0 {
            return Err(MemoraError::Configuration(
                "queue.capacity must be at least 1".to_string(),
            ));
        }
        if self.queue.max_finished_jobs == 0 {
            return Err(MemoraError::Configuration(
                "queue.max_finished_jobs must be at least 1".to_string(),
            ));
        }
        if self.server.max_content_chars == 0 || self.server.max_summary_length == 0 {
            return Err(MemoraError::Configuration(
                "server limits must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
