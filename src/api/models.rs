//! Request and response types for the HTTP API

use crate::classify::{Classification, JobStatus, MemoCategory};
use crate::summary::StoredSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Summarize request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeRequest {
    pub content: String,
    /// Target summary length in characters
    #[serde(default)]
    pub max_length: Option<usize>,
}

/// Summarize response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub summary: String,
    pub original_length: usize,
    pub summary_length: usize,
    pub chunk_count: usize,
    /// Chunks whose summary was replaced by an excerpt
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded_chunks: Vec<usize>,
}

/// Summary stored for a memo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoSummaryResponse {
    pub memo_id: String,
    pub summary: String,
    pub original_length: usize,
    pub summary_length: usize,
    pub chunk_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded_chunks: Vec<usize>,
    pub summarized_at: DateTime<Utc>,
}

impl MemoSummaryResponse {
    pub fn new(memo_id: String, stored: StoredSummary) -> Self {
        Self {
            memo_id,
            summary_length: stored.summary.text.chars().count(),
            summary: stored.summary.text,
            original_length: stored.original_length,
            chunk_count: stored.summary.chunk_count,
            degraded_chunks: stored.summary.degraded_chunks,
            summarized_at: stored.summarized_at,
        }
    }
}

/// Classify request, also used for background reclassification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyRequest {
    pub content: String,
}

/// Classification as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationView {
    pub category: MemoCategory,
    pub category_label: String,
    pub confidence: f32,
    pub reasoning: String,
    pub classified_at: DateTime<Utc>,
}

impl From<Classification> for ClassificationView {
    fn from(c: Classification) -> Self {
        Self {
            category: c.category,
            category_label: c.category.korean_label().to_string(),
            confidence: c.confidence,
            reasoning: c.reasoning,
            classified_at: c.classified_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub classification: ClassificationView,
}

/// Stored classification for a memo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoClassificationResponse {
    pub memo_id: String,
    pub classification: ClassificationView,
}

/// Accepted background job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobAcceptedResponse {
    pub job_id: Uuid,
    pub memo_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    #[serde(flatten)]
    pub status: JobStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Error codes
pub mod error_codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";
    pub const QUEUE_FULL: &str = "QUEUE_FULL";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}
