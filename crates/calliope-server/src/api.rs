//! Shared API error type for the Calliope server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use calliope_dialog::TurnError;
use thiserror::Error;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<TurnError> for ApiError {
    fn from(e: TurnError) -> Self {
        match e {
            TurnError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            TurnError::AgentNotFound(id) => ApiError::NotFound(format!("agent {} not found", id)),
            other => ApiError::InternalServerError(other.to_string()),
        }
    }
}
