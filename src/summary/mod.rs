//! Bounded-context summarization
//!
//! Long memos are split into budget-sized chunks, summarized chunk by chunk,
//! and the partial summaries are merged with one more collaborator call.

pub mod chunker;
pub mod models;
pub mod store;
pub mod summarizer;
pub mod token_budget;
pub mod token_estimator;

pub use chunker::TextChunker;
pub use models::{Chunk, FinalSummary, PartialSummary};
pub use store::{InMemorySummaryStore, StoredSummary, SummarySink};
pub use summarizer::{HierarchicalSummarizer, SummarizeError, SummarizerConfig};
pub use token_budget::{per_chunk_length, BudgetError, TokenBudgetConfig};
pub use token_estimator::{ScriptWeightedEstimator, TokenEstimator};
