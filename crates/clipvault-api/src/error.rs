//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Every failed submission or
//! archive read renders as `{message, error: {kind, code, detail, payload?}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use clipvault_core::{ErrorKind, ErrorMetadata, LogLevel, PipelineError};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    pub detail: String,
    /// Whether retrying the same request may succeed
    pub recoverable: bool,
    /// Error body returned by the remote store, when there was one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub error: ErrorDetail,
}

impl From<&PipelineError> for ErrorResponse {
    fn from(err: &PipelineError) -> Self {
        Self {
            message: err.client_message(),
            error: ErrorDetail {
                kind: err.kind(),
                code: err.error_code().to_string(),
                detail: err.message().to_string(),
                recoverable: err.is_recoverable(),
                payload: err.payload().cloned(),
            },
        }
    }
}

/// Wrapper type for PipelineError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for PipelineError (external type from clipvault-core)
#[derive(Debug)]
pub struct HttpAppError(pub PipelineError);

impl From<PipelineError> for HttpAppError {
    fn from(err: PipelineError) -> Self {
        HttpAppError(err)
    }
}

fn log_error(error: &PipelineError) {
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, code = code, "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, code = code, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, code = code, "Request failed");
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let error = &self.0;

        let status = StatusCode::from_u16(error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(error);

        (status, Json(ErrorResponse::from(error))).into_response()
    }
}
