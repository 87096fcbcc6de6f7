//! Token budget configuration for bounded-context summarization
//!
//! Budget policy:
//! - Input per collaborator call: ≤15,000 estimated tokens
//! - Dense-script characters (CJK/Hangul): 1.5 tokens each
//! - Other characters: 0.25 tokens each
//! - Output per chunk / aggregation call: 1,024 tokens
//!
//! The weights over-estimate on purpose so oversized input is split early.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token budget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBudgetConfig {
    /// Ceiling on estimated input tokens for one collaborator call
    #[serde(default = "default_max_input_tokens")]
    pub max_input_tokens: usize,

    /// Estimated tokens per CJK/Hangul character
    #[serde(default = "default_dense_weight")]
    pub dense_token_weight: f64,

    /// Estimated tokens per any other character
    #[serde(default = "default_other_weight")]
    pub other_token_weight: f64,

    /// Output ceiling for each per-chunk summarization call
    #[serde(default = "default_output_tokens")]
    pub chunk_output_tokens: u32,

    /// Output ceiling for the aggregation call
    #[serde(default = "default_output_tokens")]
    pub aggregate_output_tokens: u32,
}

fn default_max_input_tokens() -> usize { 15_000 }
fn default_dense_weight() -> f64 { 1.5 }
fn default_other_weight() -> f64 { 0.25 }
fn default_output_tokens() -> u32 { 1024 }

impl Default for TokenBudgetConfig {
    fn default() -> Self {
        Self {
            max_input_tokens: default_max_input_tokens(),
            dense_token_weight: default_dense_weight(),
            other_token_weight: default_other_weight(),
            chunk_output_tokens: default_output_tokens(),
            aggregate_output_tokens: default_output_tokens(),
        }
    }
}

impl TokenBudgetConfig {
    /// Validate that the budget configuration is usable
    pub fn validate(&self) -> Result<(), BudgetError> {
        if self.max_input_tokens == 0 {
            return Err(BudgetError::ConfigurationInvalid(
                "max_input_tokens must be greater than zero".to_string(),
            ));
        }

        for (name, weight) in [
            ("dense_token_weight", self.dense_token_weight),
            ("other_token_weight", self.other_token_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(BudgetError::ConfigurationInvalid(format!(
                    "{} must be a finite, non-negative number (got {})",
                    name, weight
                )));
            }
        }

        if self.chunk_output_tokens == 0 || self.aggregate_output_tokens == 0 {
            return Err(BudgetError::ConfigurationInvalid(
                "output token ceilings must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Whether text with the given estimate has to be chunked
    pub fn requires_chunking(&self, estimated_tokens: usize) -> bool {
        estimated_tokens > self.max_input_tokens
    }
}

/// Output length allowance per chunk: `ceil(max_length / chunk_count)`.
///
/// Every chunk gets the same share regardless of its size.
pub fn per_chunk_length(max_length: usize, chunk_count: usize) -> usize {
    if chunk_count == 0 {
        return max_length;
    }
    max_length.div_ceil(chunk_count).max(1)
}

/// Token budget errors
#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("Configuration invalid: {0}")]
    ConfigurationInvalid(String),
}
