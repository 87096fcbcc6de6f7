//! Destination for background classification results

use super::models::Classification;
use async_trait::async_trait;
use dashmap::DashMap;

/// Receives finished classifications from the background queue
#[async_trait]
pub trait ClassificationSink: Send + Sync {
    /// Persist the classification for a memo, replacing any previous one
    async fn store(&self, memo_id: &str, classification: Classification) -> Result<(), String>;
}

/// In-process classification store
#[derive(Debug, Default)]
pub struct InMemoryClassificationStore {
    entries: DashMap<String, Classification>,
}

impl InMemoryClassificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest classification for a memo
    pub fn get(&self, memo_id: &str) -> Option<Classification> {
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
impl ClassificationSink for InMemoryClassificationStore {
    async fn store(&self, memo_id: &str, classification: Classification) -> Result<(), String> {
        self.entries.insert(memo_id.to_string(), classification);
        Ok(())
    }
}
