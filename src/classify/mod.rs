//! Memo classification
//!
//! A [`Classifier`] assigns one of a fixed set of categories with a single
//! structured call. [`ClassificationQueue`] runs reclassification in the
//! background and hands results to a [`ClassificationSink`].

pub mod classifier;
pub mod models;
pub mod queue;
pub mod store;

pub use classifier::{Classifier, ClassifierConfig, ClassifyError};
pub use models::{Classification, ClassificationJob, JobStatus, MemoCategory};
pub use queue::{ClassificationQueue, QueueConfig, QueueError};
pub use store::{ClassificationSink, InMemoryClassificationStore};
