//! Bounded background queue for memo reclassification

use super::classifier::Classifier;
use super::models::{ClassificationJob, JobStatus};
use super::store::ClassificationSink;
use crate::metrics::METRICS;
use chrono::Utc;
use dashmap::DashMap;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Background classification queue configuration
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Jobs that may wait before submissions are rejected
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// How long a finished job's status stays queryable, in seconds
    #[serde(default = "default_finished_retention_secs")]
    pub finished_retention_secs: u64,

    /// Most finished job statuses kept at once
    #[serde(default = "default_max_finished_jobs")]
    pub max_finished_jobs: usize,
}

fn default_capacity() -> usize {
    256
}

fn default_finished_retention_secs() -> u64 {
    3_600
}

fn default_max_finished_jobs() -> usize {
    10_000
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            finished_retention_secs: default_finished_retention_secs(),
            max_finished_jobs: default_max_finished_jobs(),
        }
    }
}

impl QueueConfig {
    /// Config with the given capacity and default retention
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    pub fn finished_retention(&self) -> Duration {
        Duration::from_secs(self.finished_retention_secs)
    }
}

/// Queue submission errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("Classification queue is full")]
    Full,

    #[error("Classification queue is closed")]
    Closed,
}

/// Job statuses with bounded retention of finished entries.
///
/// Queued and running jobs are never evicted. Finished jobs are dropped
/// oldest first once they outlive the retention window or exceed the count
/// limit.
struct JobTable {
    statuses: DashMap<Uuid, JobStatus>,
    finished: Mutex<VecDeque<(Uuid, Instant)>>,
    retention: Duration,
    max_finished: usize,
}

impl JobTable {
    fn new(config: &QueueConfig) -> Self {
        Self {
            statuses: DashMap::new(),
            finished: Mutex::new(VecDeque::new()),
            retention: config.finished_retention(),
            max_finished: config.max_finished_jobs,
        }
    }

    fn get(&self, job_id: &Uuid) -> Option<JobStatus> {
        self.statuses.get(job_id).map(|entry| entry.value().clone())
    }

    fn set(&self, job_id: Uuid, status: JobStatus) {
        self.statuses.insert(job_id, status);
    }

    fn remove(&self, job_id: &Uuid) {
        self.statuses.remove(job_id);
    }

    fn finish(&self, job_id: Uuid, status: JobStatus) {
        self.statuses.insert(job_id, status);
        if let Ok(mut finished) = self.finished.lock() {
            finished.push_back((job_id, Instant::now()));
        }
        self.evict_expired();
    }

    fn evict_expired(&self) {
        let Ok(mut finished) = self.finished.lock() else {
            return;
        };

        let mut evicted = 0;
        while let Some((job_id, at)) = finished.front().copied() {
            if finished.len() <= self.max_finished && at.elapsed() < self.retention {
                break;
            }
            finished.pop_front();
            self.statuses.remove(&job_id);
            evicted += 1;
        }

        if evicted > 0 {
            debug!("Evicted {} finished job statuses", evicted);
        }
    }
}

/// Handle for submitting background classification jobs
///
/// Cloning shares the same channel and status table. The worker stops once
/// every handle has been dropped and the channel has drained.
#[derive(Clone)]
pub struct ClassificationQueue {
    sender: mpsc::Sender<ClassificationJob>,
    jobs: Arc<JobTable>,
}

impl ClassificationQueue {
    /// Start the worker and return the submission handle
    pub fn spawn(
        classifier: Arc<Classifier>,
        sink: Arc<dyn ClassificationSink>,
        config: QueueConfig,
    ) -> (Self, JoinHandle<()>) {
        let capacity = config.capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let jobs = Arc::new(JobTable::new(&config));

        let worker = tokio::spawn(run_worker(receiver, classifier, sink, jobs.clone()));
        info!(
            "Classification queue started (capacity={}, finished retention={}s, max finished={})",
            capacity, config.finished_retention_secs, config.max_finished_jobs
        );

        (Self { sender, jobs }, worker)
    }

    /// Enqueue a memo without waiting for room in the channel
    pub fn submit(&self, memo_id: &str, content: &str) -> Result<Uuid, QueueError> {
        let job = ClassificationJob {
            job_id: Uuid::new_v4(),
            memo_id: memo_id.to_string(),
            content: content.to_string(),
            submitted_at: Utc::now(),
        };
        let job_id = job.job_id;

        // Status goes in first so the worker never sees an unknown job
        self.jobs.set(job_id, JobStatus::Queued);

        match self.sender.try_send(job) {
            Ok(()) => {
                debug!("Queued classification job {} for memo {}", job_id, memo_id);
                METRICS.record_queue_submission(true);
                Ok(job_id)
            }
            Err(e) => {
                self.jobs.remove(&job_id);
                METRICS.record_queue_submission(false);
                match e {
                    mpsc::error::TrySendError::Full(_) => {
                        warn!("Classification queue full, rejecting memo {}", memo_id);
                        Err(QueueError::Full)
                    }
                    mpsc::error::TrySendError::Closed(_) => Err(QueueError::Closed),
                }
            }
        }
    }

    /// Current status of a job, if it is known and not yet evicted
    pub fn status(&self, job_id: &Uuid) -> Option<JobStatus> {
        self.jobs.evict_expired();
        self.jobs.get(job_id)
    }

    /// Number of job statuses currently held
    pub fn tracked_jobs(&self) -> usize {
        self.jobs.statuses.len()
    }
}

async fn run_worker(
    mut receiver: mpsc::Receiver<ClassificationJob>,
    classifier: Arc<Classifier>,
    sink: Arc<dyn ClassificationSink>,
    jobs: Arc<JobTable>,
) {
    while let Some(job) = receiver.recv().await {
        jobs.set(job.job_id, JobStatus::Running);
        debug!(
            "Classifying memo {} (job {}, waited {}ms)",
            job.memo_id,
            job.job_id,
            (Utc::now() - job.submitted_at).num_milliseconds()
        );

        let status = match classifier.classify(&job.content).await {
            Ok(classification) => {
                let category = classification.category;
                match sink.store(&job.memo_id, classification).await {
                    Ok(()) => {
                        info!("Memo {} reclassified as {}", job.memo_id, category);
                        JobStatus::Succeeded { category }
                    }
                    Err(reason) => {
                        error!("Failed to store classification for memo {}: {}", job.memo_id, reason);
                        JobStatus::Failed { reason }
                    }
                }
            }
            Err(e) => {
                error!("Background classification failed for memo {}: {}", job.memo_id, e);
                JobStatus::Failed { reason: e.to_string() }
            }
        };

        METRICS.record_queue_job(matches!(status, JobStatus::Succeeded { .. }));
        jobs.finish(job.job_id, status);
    }

    info!("Classification queue worker stopped");
}
