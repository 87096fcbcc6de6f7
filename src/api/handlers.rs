//! HTTP handlers

use super::models::*;
use crate::classify::{
    ClassificationQueue, Classifier, ClassifyError, InMemoryClassificationStore, QueueError,
};
use crate::config::ServerConfig;
use crate::metrics::METRICS;
use crate::summary::{
    FinalSummary, HierarchicalSummarizer, InMemorySummaryStore, StoredSummary, SummarizeError,
    SummarySink,
};
use crate::time_operation;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

type ApiFailure = (StatusCode, Json<ApiError>);

/// Request limits enforced before any collaborator call
#[derive(Debug, Clone, Copy)]
pub struct ApiLimits {
    pub max_content_chars: usize,
    pub max_summary_length: usize,
}

impl From<&ServerConfig> for ApiLimits {
    fn from(config: &ServerConfig) -> Self {
        Self {
            max_content_chars: config.max_content_chars,
            max_summary_length: config.max_summary_length,
        }
    }
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub summarizer: Arc<HierarchicalSummarizer>,
    pub classifier: Arc<Classifier>,
    pub queue: ClassificationQueue,
    pub store: Arc<InMemoryClassificationStore>,
    pub summaries: Arc<InMemorySummaryStore>,
    pub limits: ApiLimits,
}

fn failure(status: StatusCode, code: &str, message: impl Into<String>) -> ApiFailure {
    (status, Json(ApiError::new(code, message)))
}

fn validate_content(content: &str, limits: &ApiLimits) -> Result<usize, ApiFailure> {
    if content.trim().is_empty() {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            error_codes::VALIDATION_ERROR,
            "Content cannot be empty",
        ));
    }

    let chars = content.chars().count();
    if chars > limits.max_content_chars {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            error_codes::VALIDATION_ERROR,
            format!(
                "Content is {} characters, the limit is {}",
                chars, limits.max_content_chars
            ),
        ));
    }

    Ok(chars)
}

/// Summarize a memo
///
/// POST /api/v1/summarize
pub async fn summarize(
    State(state): State<AppState>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, ApiFailure> {
    time_operation!(
        METRICS.http_request_duration,
        "summarize",
        summarize_inner(&state, request).await
    )
}

async fn summarize_inner(
    state: &AppState,
    request: SummarizeRequest,
) -> Result<Json<SummarizeResponse>, ApiFailure> {
    let (summary, original_length) = run_summarizer(state, &request).await?;

    Ok(Json(SummarizeResponse {
        summary_length: summary.text.chars().count(),
        summary: summary.text,
        original_length,
        chunk_count: summary.chunk_count,
        degraded_chunks: summary.degraded_chunks,
    }))
}

/// Validate a summarize request and run the pipeline, returning the summary
/// and the source length in characters
async fn run_summarizer(
    state: &AppState,
    request: &SummarizeRequest,
) -> Result<(FinalSummary, usize), ApiFailure> {
    let original_length = validate_content(&request.content, &state.limits)?;

    let max_length = request
        .max_length
        .unwrap_or(state.summarizer.config().default_max_length);
    if max_length == 0 || max_length > state.limits.max_summary_length {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            error_codes::VALIDATION_ERROR,
            format!(
                "max_length must be between 1 and {}",
                state.limits.max_summary_length
            ),
        ));
    }

    info!(
        "Summarize request: {} chars, max_length={}",
        original_length, max_length
    );

    match state.summarizer.summarize(&request.content, max_length).await {
        Ok(summary) => {
            if summary.is_degraded() {
                warn!("Summary returned with degraded chunks {:?}", summary.degraded_chunks);
            }
            Ok((summary, original_length))
        }
        Err(SummarizeError::EmptyInput) => Err(failure(
            StatusCode::BAD_REQUEST,
            error_codes::VALIDATION_ERROR,
            "Content cannot be empty",
        )),
        Err(e) => {
            error!("Summarization failed: {}", e);
            Err(failure(
                StatusCode::BAD_GATEWAY,
                error_codes::UPSTREAM_ERROR,
                e.to_string(),
            ))
        }
    }
}

/// Summarize a memo and keep the result for later lookup
///
/// POST /api/v1/memos/:memo_id/summary
pub async fn summarize_memo(
    State(state): State<AppState>,
    Path(memo_id): Path<String>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<MemoSummaryResponse>, ApiFailure> {
    time_operation!(
        METRICS.http_request_duration,
        "summarize_memo",
        summarize_memo_inner(&state, memo_id, request).await
    )
}

async fn summarize_memo_inner(
    state: &AppState,
    memo_id: String,
    request: SummarizeRequest,
) -> Result<Json<MemoSummaryResponse>, ApiFailure> {
    let (summary, original_length) = run_summarizer(state, &request).await?;

    let stored = StoredSummary {
        summary,
        original_length,
        summarized_at: Utc::now(),
    };
    if let Err(reason) = state.summaries.store(&memo_id, stored.clone()).await {
        error!("Failed to store summary for memo {}: {}", memo_id, reason);
        return Err(failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            reason,
        ));
    }

    info!("Stored summary for memo {}", memo_id);
    Ok(Json(MemoSummaryResponse::new(memo_id, stored)))
}

/// Latest stored summary for a memo
///
/// GET /api/v1/memos/:memo_id/summary
pub async fn get_memo_summary(
    State(state): State<AppState>,
    Path(memo_id): Path<String>,
) -> Result<Json<MemoSummaryResponse>, ApiFailure> {
    match state.summaries.get(&memo_id) {
        Some(stored) => Ok(Json(MemoSummaryResponse::new(memo_id, stored))),
        None => Err(failure(
            StatusCode::NOT_FOUND,
            error_codes::NOT_FOUND,
            format!("No summary for memo {}", memo_id),
        )),
    }
}

/// Classify a memo synchronously
///
/// POST /api/v1/classify
pub async fn classify(
    State(state): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, ApiFailure> {
    time_operation!(
        METRICS.http_request_duration,
        "classify",
        classify_inner(&state, request).await
    )
}

async fn classify_inner(
    state: &AppState,
    request: ClassifyRequest,
) -> Result<Json<ClassifyResponse>, ApiFailure> {
    let chars = validate_content(&request.content, &state.limits)?;
    info!("Classify request: {} chars", chars);

    match state.classifier.classify(&request.content).await {
        Ok(classification) => Ok(Json(ClassifyResponse {
            classification: classification.into(),
        })),
        Err(ClassifyError::EmptyInput) => Err(failure(
            StatusCode::BAD_REQUEST,
            error_codes::VALIDATION_ERROR,
            "Content cannot be empty",
        )),
        Err(e) => {
            error!("Classification failed: {}", e);
            Err(failure(
                StatusCode::BAD_GATEWAY,
                error_codes::UPSTREAM_ERROR,
                e.to_string(),
            ))
        }
    }
}

/// Queue background reclassification of a memo
///
/// POST /api/v1/memos/:memo_id/classification
pub async fn reclassify_memo(
    State(state): State<AppState>,
    Path(memo_id): Path<String>,
    Json(request): Json<ClassifyRequest>,
) -> Result<(StatusCode, Json<JobAcceptedResponse>), ApiFailure> {
    validate_content(&request.content, &state.limits)?;

    match state.queue.submit(&memo_id, &request.content) {
        Ok(job_id) => {
            info!("Reclassification queued: memo_id={}, job_id={}", memo_id, job_id);
            Ok((
                StatusCode::ACCEPTED,
                Json(JobAcceptedResponse { job_id, memo_id }),
            ))
        }
        Err(QueueError::Full) => Err(failure(
            StatusCode::SERVICE_UNAVAILABLE,
            error_codes::QUEUE_FULL,
            "Classification queue is full, retry later",
        )),
        Err(e @ QueueError::Closed) => {
            error!("Reclassification rejected: {}", e);
            Err(failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
                e.to_string(),
            ))
        }
    }
}

/// Latest stored classification for a memo
///
/// GET /api/v1/memos/:memo_id/classification
pub async fn get_memo_classification(
    State(state): State<AppState>,
    Path(memo_id): Path<String>,
) -> Result<Json<MemoClassificationResponse>, ApiFailure> {
    match state.store.get(&memo_id) {
        Some(classification) => Ok(Json(MemoClassificationResponse {
            memo_id,
            classification: classification.into(),
        })),
        None => Err(failure(
            StatusCode::NOT_FOUND,
            error_codes::NOT_FOUND,
            format!("No classification for memo {}", memo_id),
        )),
    }
}

/// Background job status
///
/// GET /api/v1/classification/jobs/:job_id
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatusResponse>, ApiFailure> {
    let job_id = Uuid::parse_str(&job_id).map_err(|_| {
        failure(
            StatusCode::BAD_REQUEST,
            error_codes::VALIDATION_ERROR,
            "job_id must be a UUID",
        )
    })?;

    match state.queue.status(&job_id) {
        Some(status) => Ok(Json(JobStatusResponse { job_id, status })),
        None => Err(failure(
            StatusCode::NOT_FOUND,
            error_codes::NOT_FOUND,
            format!("Unknown job {}", job_id),
        )),
    }
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /metrics
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        METRICS.export_prometheus(),
    )
}
