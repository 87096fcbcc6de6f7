//! Data models for memo classification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Memo category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoCategory {
    Work,
    Personal,
    Study,
    Idea,
    Todo,
    Other,
}

impl MemoCategory {
    pub const ALL: [MemoCategory; 6] = [
        MemoCategory::Work,
        MemoCategory::Personal,
        MemoCategory::Study,
        MemoCategory::Idea,
        MemoCategory::Todo,
        MemoCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MemoCategory::Work => "work",
            MemoCategory::Personal => "personal",
            MemoCategory::Study => "study",
            MemoCategory::Idea => "idea",
            MemoCategory::Todo => "todo",
            MemoCategory::Other => "other",
        }
    }

    /// Korean display label
    pub fn korean_label(&self) -> &'static str {
        match self {
            MemoCategory::Work => "업무",
            MemoCategory::Personal => "개인",
            MemoCategory::Study => "학습",
            MemoCategory::Idea => "아이디어",
            MemoCategory::Todo => "할일",
            MemoCategory::Other => "기타",
        }
    }

    /// Parse an English or Korean label, ignoring case and surrounding space
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == label || c.korean_label() == label)
    }
}

impl fmt::Display for MemoCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub category: MemoCategory,
    /// Model confidence in 0.0-1.0
    pub confidence: f32,
    pub reasoning: String,
    pub classified_at: DateTime<Utc>,
}

/// Background classification job
#[derive(Debug, Clone)]
pub struct ClassificationJob {
    pub job_id: Uuid,
    pub memo_id: String,
    pub content: String,
    pub submitted_at: DateTime<Utc>,
}

/// Lifecycle of a background job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded { category: MemoCategory },
    Failed { reason: String },
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Succeeded { .. } | JobStatus::Failed { .. })
    }
}
