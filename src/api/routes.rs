//! Router configuration

use super::handlers::{self, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Build the service router
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    let api_routes = Router::new()
        .route("/api/v1/summarize", post(handlers::summarize))
        .route("/api/v1/classify", post(handlers::classify))
        .route(
            "/api/v1/memos/:memo_id/classification",
            post(handlers::reclassify_memo).get(handlers::get_memo_classification),
        )
        .route(
            "/api/v1/memos/:memo_id/summary",
            post(handlers::summarize_memo).get(handlers::get_memo_summary),
        )
        .route(
            "/api/v1/classification/jobs/:job_id",
            get(handlers::get_job_status),
        )
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .merge(api_routes)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
