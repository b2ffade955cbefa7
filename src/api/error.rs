use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

/// Failure surfaced at the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{error}: {details}")]
    Internal { error: &'static str, details: String },
    #[error("invalid query: {details}")]
    BadRequest { details: String },
}

impl ApiError {
    pub fn internal(error: &'static str, cause: &anyhow::Error) -> Self {
        Self::Internal {
            error,
            details: format!("{cause:#}"),
        }
    }

    pub fn bad_request(rejection: QueryRejection) -> Self {
        Self::BadRequest {
            details: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Internal { error, details } => {
                error!(error, details = %details, "Request failed");
                let body = serde_json::json!({
                    "success": false,
                    "error": error,
                    "details": details,
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
            Self::BadRequest { details } => {
                let body = serde_json::json!({
                    "success": false,
                    "error": "Invalid query parameters",
                    "details": details,
                });
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
        }
    }
}
