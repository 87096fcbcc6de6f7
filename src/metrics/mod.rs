//! Metrics collection for observability

use prometheus::{
    Counter, CounterVec, Histogram, HistogramOpts, HistogramVec, IntGauge, Opts, Registry,
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_vec_with_registry, register_histogram_with_registry,
    register_int_gauge_with_registry,
};
use std::sync::Arc;
use std::time::Duration;
use once_cell::sync::Lazy;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Collaborator metrics
    pub llm_requests: CounterVec,
    pub llm_request_duration: HistogramVec,

    // Summarization metrics
    pub summaries: CounterVec,
    pub summary_chunks: Histogram,
    pub degraded_chunks: Counter,

    // Classification metrics
    pub classifications: CounterVec,

    // Background queue metrics
    pub queue_submissions: CounterVec,
    pub queue_jobs: CounterVec,
    pub queue_depth: IntGauge,

    // HTTP metrics
    pub http_request_duration: HistogramVec,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let llm_requests = register_counter_vec_with_registry!(
            Opts::new("memora_llm_requests_total", "Total text-generation requests"),
            &["operation", "status"],
            registry
        )?;

        let llm_request_duration = register_histogram_vec_with_registry!(
            "memora_llm_request_duration_seconds",
            "Text-generation request duration in seconds, including retries",
            &["operation"],
            registry
        )?;

        let summaries = register_counter_vec_with_registry!(
            Opts::new("memora_summaries_total", "Total summarization runs"),
            &["path", "status"],
            registry
        )?;

        let summary_chunks = register_histogram_with_registry!(
            HistogramOpts::new("memora_summary_chunks", "Chunks per chunked summarization")
                .buckets(vec![2.0, 3.0, 4.0, 6.0, 8.0, 12.0, 16.0, 32.0]),
            registry
        )?;

        let degraded_chunks = register_counter_with_registry!(
            Opts::new(
                "memora_summary_degraded_chunks_total",
                "Chunks whose summary was replaced by a raw excerpt"
            ),
            registry
        )?;

        let classifications = register_counter_vec_with_registry!(
            Opts::new("memora_classifications_total", "Total classifications by category"),
            &["category"],
            registry
        )?;

        let queue_submissions = register_counter_vec_with_registry!(
            Opts::new("memora_queue_submissions_total", "Background classification submissions"),
            &["status"],
            registry
        )?;

        let queue_jobs = register_counter_vec_with_registry!(
            Opts::new("memora_queue_jobs_total", "Background classification jobs processed"),
            &["status"],
            registry
        )?;

        let queue_depth = register_int_gauge_with_registry!(
            Opts::new("memora_queue_depth", "Jobs waiting in the classification queue"),
            registry
        )?;

        let http_request_duration = register_histogram_vec_with_registry!(
            "memora_http_request_duration_seconds",
            "HTTP handler duration in seconds",
            &["endpoint"],
            registry
        )?;

        Ok(Self {
            registry,
            llm_requests,
            llm_request_duration,
            summaries,
            summary_chunks,
            degraded_chunks,
            classifications,
            queue_submissions,
            queue_jobs,
            queue_depth,
            http_request_duration,
        })
    }

    /// Get the metrics registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a text-generation request
    pub fn record_llm_request(&self, operation: &str, status: &str, elapsed: Duration) {
        self.llm_requests.with_label_values(&[operation, status]).inc();
        self.llm_request_duration
            .with_label_values(&[operation])
            .observe(elapsed.as_secs_f64());
    }

    /// Record a summarization run. `path` is `"direct"` or `"chunked"`.
    pub fn record_summary(&self, path: &str, chunk_count: usize, degraded: usize, success: bool) {
        let status = if success { "success" } else { "error" };
        self.summaries.with_label_values(&[path, status]).inc();
        if path == "chunked" {
            self.summary_chunks.observe(chunk_count as f64);
        }
        if degraded > 0 {
            self.degraded_chunks.inc_by(degraded as f64);
        }
    }

    /// Record a classification result
    pub fn record_classification(&self, category: &str) {
        self.classifications.with_label_values(&[category]).inc();
    }

    /// Record a queue submission attempt
    pub fn record_queue_submission(&self, accepted: bool) {
        let status = if accepted { "accepted" } else { "rejected" };
        self.queue_submissions.with_label_values(&[status]).inc();
        if accepted {
            self.queue_depth.inc();
        }
    }

    /// Record a processed background job
    pub fn record_queue_job(&self, success: bool) {
        let status = if success { "success" } else { "error" };
        self.queue_jobs.with_label_values(&[status]).inc();
        self.queue_depth.dec();
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap_or_default();

        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Helper macro to time operations
#[macro_export]
macro_rules! time_operation {
    ($histogram:expr, $label:expr, $operation:expr) => {{
        let timer = $histogram.with_label_values(&[$label]).start_timer();
        let result = $operation;
        timer.observe_duration();
        result
    }};
}
