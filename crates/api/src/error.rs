//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::SpecificationError;
use pipeline::PipelineError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Pipeline execution error.
    Pipeline(PipelineError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, serde_json::json!({ "error": msg }))
            }
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg }))
            }
            ApiError::Pipeline(err) => pipeline_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": msg }),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

fn pipeline_error_to_response(err: PipelineError) -> (StatusCode, serde_json::Value) {
    let status = match &err {
        PipelineError::InvalidSpecification(_) => StatusCode::BAD_REQUEST,
        PipelineError::FeatureNotLicensed { .. } => StatusCode::FORBIDDEN,
        PipelineError::JobNotFound(_) => StatusCode::NOT_FOUND,
        PipelineError::ValidationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::CancellationRejected { .. } | PipelineError::Cancelled { .. } => {
            StatusCode::CONFLICT
        }
        PipelineError::UploadFailed { .. }
        | PipelineError::SubmissionFailed { .. }
        | PipelineError::AuthenticationFailed(_)
        | PipelineError::Provider(_)
        | PipelineError::Storage(_) => StatusCode::BAD_GATEWAY,
    };

    // Callers decide how to retry based on these fields, so they are part
    // of the response contract rather than just the message text.
    let body = serde_json::json!({
        "error": err.to_string(),
        "stage": err.stage().as_str(),
        "retriable": err.retry_with_same_external_id(),
    });
    (status, body)
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        ApiError::Pipeline(err)
    }
}

impl From<SpecificationError> for ApiError {
    fn from(err: SpecificationError) -> Self {
        ApiError::Pipeline(PipelineError::InvalidSpecification(err))
    }
}
