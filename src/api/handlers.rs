use axum::response::Json;
use serde::Serialize;

use crate::error::PimsError;

pub use crate::api::state::AppState;

/// Every handler reports failures as a `PimsError`; see `api::error` for
/// the status mapping.
pub type ApiResult<T> = Result<T, PimsError>;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
