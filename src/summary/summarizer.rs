//! Hierarchical summarization for bounded-context collaborator calls
//!
//! validate → estimate → (direct summary | chunk → per-chunk summaries → aggregate)
//!
//! Chunks are summarized one at a time, in source order. A failed chunk is
//! replaced by a raw excerpt; a failed aggregation is terminal.

use super::chunker::TextChunker;
use super::models::{Chunk, FinalSummary, PartialSummary};
use super::token_budget::{per_chunk_length, BudgetError, TokenBudgetConfig};
use super::token_estimator::{ScriptWeightedEstimator, TokenEstimator};
use crate::llm::{CollaboratorError, TextGenerator};
use crate::metrics::METRICS;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Leading labels models sometimes put in front of the summary
static LABEL_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*\**\s*(?:combined summary|summary|key points|핵심 요약|통합 요약|요약)\s*\**\s*[:：]\s*\**\s*")
        .expect("label pattern is valid")
});

const EXCERPT_MARKER: &str = "...";

// metric labels
const DIRECT_PATH: &str = "direct";
const CHUNKED_PATH: &str = "chunked";

/// Configuration for the hierarchical summarizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Summary length in characters when the caller gives none
    #[serde(default = "default_max_length")]
    pub default_max_length: usize,

    /// Length ceiling in characters for the aggregated summary
    #[serde(default = "default_aggregate_max_length")]
    pub aggregate_max_length: usize,

    /// Characters of raw chunk text used when a chunk summary fails
    #[serde(default = "default_fallback_excerpt_chars")]
    pub fallback_excerpt_chars: usize,

    #[serde(default)]
    pub budget: TokenBudgetConfig,
}

fn default_max_length() -> usize { 200 }
fn default_aggregate_max_length() -> usize { 200 }
fn default_fallback_excerpt_chars() -> usize { 100 }

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            default_max_length: default_max_length(),
            aggregate_max_length: default_aggregate_max_length(),
            fallback_excerpt_chars: default_fallback_excerpt_chars(),
            budget: TokenBudgetConfig::default(),
        }
    }
}

/// Summarizer errors
#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    #[error("Content cannot be empty")]
    EmptyInput,

    #[error("Summary generation failed: {0}")]
    Generation(#[source] CollaboratorError),

    #[error("Aggregation of {chunks} partial summaries failed: {source}")]
    Aggregation {
        chunks: usize,
        #[source]
        source: CollaboratorError,
    },
}

/// Summarizes text of any length through a bounded-context collaborator
pub struct HierarchicalSummarizer {
    generator: Arc<dyn TextGenerator>,
    chunker: TextChunker<ScriptWeightedEstimator>,
    config: SummarizerConfig,
}

impl HierarchicalSummarizer {
    /// Create a new summarizer
    pub fn new(generator: Arc<dyn TextGenerator>, config: SummarizerConfig) -> Result<Self, BudgetError> {
        let estimator = ScriptWeightedEstimator::from_config(&config.budget)?;
        Ok(Self {
            generator,
            chunker: TextChunker::new(estimator),
            config,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &SummarizerConfig {
        &self.config
    }

    /// The chunker sized by this summarizer's estimator
    pub fn chunker(&self) -> &TextChunker<ScriptWeightedEstimator> {
        &self.chunker
    }

    /// Estimate tokens for text
    pub fn estimate_tokens(&self, text: &str) -> usize {
        self.chunker.estimator().estimate(text)
    }

    /// Summarize using the configured input budget
    pub async fn summarize(&self, text: &str, max_length: usize) -> Result<FinalSummary, SummarizeError> {
        self.summarize_with_budget(text, max_length, self.config.budget.max_input_tokens)
            .await
    }

    /// Summarize `text` in about `max_length` characters, keeping each
    /// collaborator call under `max_input_tokens` estimated tokens.
    pub async fn summarize_with_budget(
        &self,
        text: &str,
        max_length: usize,
        max_input_tokens: usize,
    ) -> Result<FinalSummary, SummarizeError> {
        if text.trim().is_empty() {
            return Err(SummarizeError::EmptyInput);
        }

        let max_length = max_length.max(1);
        let estimated_tokens = self.estimate_tokens(text);

        if estimated_tokens <= max_input_tokens {
            debug!(
                "Direct summarization: {} tokens within budget {}",
                estimated_tokens, max_input_tokens
            );

            return match self.summarize_chunk(text, max_length).await {
                Ok(summary) => {
                    METRICS.record_summary(DIRECT_PATH, 1, 0, true);
                    Ok(FinalSummary {
                        text: summary,
                        chunk_count: 1,
                        degraded_chunks: Vec::new(),
                        estimated_tokens,
                    })
                }
                Err(e) => {
                    error!("Direct summarization failed: {}", e);
                    METRICS.record_summary(DIRECT_PATH, 1, 0, false);
                    Err(SummarizeError::Generation(e))
                }
            };
        }

        let chunks = self.chunker.split(text, max_input_tokens);
        let chunk_length = per_chunk_length(max_length, chunks.len());

        info!(
            "Chunked summarization: {} tokens over budget {}, {} chunks, {} chars per chunk",
            estimated_tokens,
            max_input_tokens,
            chunks.len(),
            chunk_length
        );

        let mut partials = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let outcome = self.summarize_chunk(&chunk.text, chunk_length).await;
            partials.push(self.partial_summary(chunk, outcome));
        }

        let degraded_chunks: Vec<usize> = partials
            .iter()
            .filter(|p| p.degraded)
            .map(|p| p.chunk_index)
            .collect();
        let texts: Vec<String> = partials.into_iter().map(|p| p.text).collect();

        match self.aggregate(&texts).await {
            Ok(summary) => {
                METRICS.record_summary(CHUNKED_PATH, chunks.len(), degraded_chunks.len(), true);
                Ok(FinalSummary {
                    text: summary,
                    chunk_count: chunks.len(),
                    degraded_chunks,
                    estimated_tokens,
                })
            }
            Err(source) => {
                error!("Aggregation of {} partial summaries failed: {}", texts.len(), source);
                METRICS.record_summary(CHUNKED_PATH, chunks.len(), degraded_chunks.len(), false);
                Err(SummarizeError::Aggregation {
                    chunks: chunks.len(),
                    source,
                })
            }
        }
    }

    /// Summarize one bounded piece of text as bullet key points and action
    /// items within `max_length` characters.
    pub async fn summarize_chunk(&self, text: &str, max_length: usize) -> Result<String, CollaboratorError> {
        let prompt = build_chunk_prompt(text, max_length);
        let raw = self
            .generator
            .generate(&prompt, self.config.budget.chunk_output_tokens)
            .await?;
        Ok(strip_label_prefix(&raw))
    }

    /// Merge partial summaries, in order, into one summary.
    ///
    /// A single summary is returned as is without a collaborator call.
    pub async fn aggregate(&self, summaries: &[String]) -> Result<String, CollaboratorError> {
        match summaries {
            [] => Ok(String::new()),
            [single] => Ok(single.clone()),
            _ => {
                let prompt = build_aggregate_prompt(summaries, self.config.aggregate_max_length);
                let raw = self
                    .generator
                    .generate(&prompt, self.config.budget.aggregate_output_tokens)
                    .await?;
                Ok(strip_label_prefix(&raw))
            }
        }
    }

    fn partial_summary(&self, chunk: &Chunk, outcome: Result<String, CollaboratorError>) -> PartialSummary {
        match outcome {
            Ok(text) => PartialSummary {
                chunk_index: chunk.index,
                text,
                degraded: false,
            },
            Err(e) => {
                warn!(
                    "Chunk {} summarization failed, substituting excerpt: {}",
                    chunk.index, e
                );
                PartialSummary {
                    chunk_index: chunk.index,
                    text: excerpt(&chunk.text, self.config.fallback_excerpt_chars),
                    degraded: true,
                }
            }
        }
    }
}

fn build_chunk_prompt(text: &str, max_length: usize) -> String {
    format!(
        "Summarize the following memo in at most {} characters.\n\
        List the key points as short bullet items, then list any action items.\n\
        Respond in the same language as the memo and output only the summary.\n\n\
        Memo:\n{}",
        max_length, text
    )
}

fn build_aggregate_prompt(summaries: &[String], max_length: usize) -> String {
    format!(
        "The following are summaries of consecutive sections of one memo, in order.\n\
        Combine them into a single summary of at most {} characters.\n\
        Remove duplicated points, keep every action item, and respond in the same \
        language as the summaries. Output only the combined summary.\n\n\
        Section summaries:\n{}",
        max_length,
        summaries.join("\n\n")
    )
}

/// Remove a leading "Summary:"-style label and surrounding whitespace
pub fn strip_label_prefix(raw: &str) -> String {
    LABEL_PREFIX.replace(raw, "").trim().to_string()
}

/// First `max_chars` characters of `text` followed by an ellipsis marker
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let mut out: String = text.trim().chars().take(max_chars).collect();
    out.push_str(EXCERPT_MARKER);
    out
}
