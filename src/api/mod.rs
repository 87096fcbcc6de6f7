//! HTTP surface for summarization and classification

pub mod handlers;
pub mod models;
pub mod routes;

pub use handlers::{ApiLimits, AppState};
pub use models::{error_codes, ApiError};
pub use routes::build_router;
