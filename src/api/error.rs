use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::error::PimsError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(message: &str, code: &'static str) -> Self {
        Self {
            error: message.to_string(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl PimsError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PimsError::NotFound { .. } => StatusCode::NOT_FOUND,
            PimsError::Conflict { .. } => StatusCode::CONFLICT,
            PimsError::Forbidden { .. } => StatusCode::FORBIDDEN,
            PimsError::Validation(_) => StatusCode::BAD_REQUEST,
            PimsError::Upstream(_) => StatusCode::BAD_GATEWAY,
            PimsError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            PimsError::NotFound { .. } => "NOT_FOUND",
            PimsError::Conflict { .. } => "CONCURRENCY_CONFLICT",
            PimsError::Forbidden { .. } => "FORBIDDEN",
            PimsError::Validation(_) => "VALIDATION_ERROR",
            PimsError::Upstream(_) => "UPSTREAM_REQUEST_FAILED",
            PimsError::Store(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for PimsError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            PimsError::Store(e) => {
                log::error!("Request failed: {:#}", e);
                ErrorResponse::new("An internal error occurred", self.code())
            }
            PimsError::Conflict {
                submitted, current, ..
            } => ErrorResponse::new(&self.to_string(), self.code())
                .with_details(json!({ "submittedRowVersion": submitted, "currentRowVersion": current })),
            PimsError::Upstream(e) => {
                log::warn!("Upstream request failed: {}", e);
                ErrorResponse::new(&self.to_string(), self.code())
                    .with_details(json!({ "url": e.url, "status": e.status, "body": e.body }))
            }
            _ => ErrorResponse::new(&self.to_string(), self.code()),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::HttpClientRequestError;
    use crate::model::Permission;

    #[test]
    fn every_variant_has_its_status() {
        let cases = [
            (PimsError::not_found("lease", 1), StatusCode::NOT_FOUND),
            (
                PimsError::Conflict {
                    entity: "lease",
                    submitted: 1,
                    current: 2,
                },
                StatusCode::CONFLICT,
            ),
            (
                PimsError::Forbidden {
                    permission: Permission::LeaseEdit,
                },
                StatusCode::FORBIDDEN,
            ),
            (PimsError::validation("bad"), StatusCode::BAD_REQUEST),
            (
                PimsError::Upstream(HttpClientRequestError {
                    url: "http://ltsa.test/orders".to_string(),
                    status: Some(500),
                    body: None,
                    message: "boom".to_string(),
                }),
                StatusCode::BAD_GATEWAY,
            ),
            (
                PimsError::Store(anyhow::anyhow!("pool closed")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn conflict_code_is_stable() {
        let error = PimsError::Conflict {
            entity: "role",
            submitted: 1,
            current: 3,
        };
        assert_eq!(error.code(), "CONCURRENCY_CONFLICT");
    }
}
