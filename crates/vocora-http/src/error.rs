//! HTTP-specific error type and its mapping onto [`vocora_core::PipelineError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use vocora_core::PipelineError;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("the pipeline is busy with another turn")]
    Busy,

    #[error("request timed out")]
    Timeout,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("pipeline not ready: {0}")]
    NotReady(String),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            HttpError::Busy => (StatusCode::CONFLICT, self.to_string()),
            HttpError::Timeout => (StatusCode::GATEWAY_TIMEOUT, self.to_string()),
            HttpError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            HttpError::NotReady(_) => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            HttpError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = ErrorBody { error: message, status: status.as_u16() };
        (status, Json(body)).into_response()
    }
}

impl From<PipelineError> for HttpError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Busy => HttpError::Busy,
            PipelineError::Timeout => HttpError::Timeout,
            PipelineError::Configuration(msg) => HttpError::BadRequest(msg),
            PipelineError::NotReady(msg) => HttpError::NotReady(msg),
            other => HttpError::Internal(other.to_string()),
        }
    }
}
