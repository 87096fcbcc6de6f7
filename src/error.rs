//! Crate-level error type

use crate::classify::{ClassifyError, QueueError};
use crate::llm::CollaboratorError;
use crate::summary::{BudgetError, SummarizeError};
use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, MemoraError>;

/// Top-level error for configuration, startup and request handling
#[derive(Debug, Error)]
pub enum MemoraError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Budget(#[from] BudgetError),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error(transparent)]
    Summarize(#[from] SummarizeError),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<config::ConfigError> for MemoraError {
    fn from(e: config::ConfigError) -> Self {
        MemoraError::Configuration(e.to_string())
    }
}
