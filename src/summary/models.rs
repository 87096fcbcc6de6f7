//! Data models for the summarization pipeline

use serde::{Deserialize, Serialize};

/// A contiguous fragment of source text sized for one collaborator call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position in source order, starting at 0
    pub index: usize,
    pub text: String,
    /// Estimate recomputed for this chunk's own text
    pub token_estimate: usize,
}

/// Summary of a single chunk prior to aggregation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialSummary {
    pub chunk_index: usize,
    pub text: String,
    /// True when the collaborator failed and a raw excerpt was substituted
    pub degraded: bool,
}

/// Result of a complete summarization run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalSummary {
    pub text: String,
    /// Number of chunks the source was split into (1 on the direct path)
    pub chunk_count: usize,
    /// Chunk indices whose summary was replaced by an excerpt
    pub degraded_chunks: Vec<usize>,
    /// Token estimate of the source text
    pub estimated_tokens: usize,
}

impl FinalSummary {
    /// Whether any chunk fell back to a raw excerpt
    pub fn is_degraded(&self) -> bool {
        !self.degraded_chunks.is_empty()
    }
}
