//! Memora: memo summarization and classification through a bounded-context
//! text-generation collaborator.
//!
//! Long memos are split into sentence-aligned chunks that each fit the
//! collaborator's input budget, summarized one at a time, and merged by an
//! aggregation call. Classification sends at most one budget-sized chunk.

pub mod api;
pub mod classify;
pub mod config;
pub mod error;
pub mod llm;
pub mod metrics;
pub mod summary;
pub mod telemetry;

pub use classify::{Classification, ClassificationQueue, Classifier, MemoCategory};
pub use config::Config;
pub use error::{MemoraError, Result};
pub use llm::{AnthropicClient, CollaboratorError, TextGenerator};
pub use summary::{FinalSummary, HierarchicalSummarizer, ScriptWeightedEstimator, TextChunker};
