//! Per-memo summary storage

use super::models::FinalSummary;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// A summary kept for a memo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSummary {
    pub summary: FinalSummary,
    /// Source length in characters
    pub original_length: usize,
    pub summarized_at: DateTime<Utc>,
}

/// Receives finished summaries keyed by memo
#[async_trait]
pub trait SummarySink: Send + Sync {
    /// Persist the summary for a memo, replacing any previous one
    async fn store(&self, memo_id: &str, summary: StoredSummary) -> Result<(), String>;
}

/// In-process summary store
#[derive(Debug, Default)]
pub struct InMemorySummaryStore {
    entries: DashMap<String, StoredSummary>,
}

impl InMemorySummaryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, memo_id: &str) -> Option<StoredSummary> {
        self.entries.get(memo_id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SummarySink for InMemorySummaryStore {
    async fn store(&self, memo_id: &str, summary: StoredSummary) -> Result<(), String> {
        self.entries.insert(memo_id.to_string(), summary);
        Ok(())
    }
}
