//! HTTP-facing error type
//!
//! Every error body has the shape `{"error": "<message>"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::error::Error;
use crate::load::ParamError;

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned by request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected path parameter
    #[error(transparent)]
    BadRequest(#[from] ParamError),

    /// Concurrent load limit reached
    #[error("Too many concurrent load requests ({limit} running). Try again later.")]
    Busy { limit: usize },

    /// Worker fan-out failed
    #[error("Load generation failed: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Busy { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        error!(error = %err.format_for_log(), "Load run failed");
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_bad_request_body() {
        let response = ApiError::from(ParamError::InvalidMinutes).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(
            body["error"],
            "Invalid duration. Please provide a positive integer (minutes)."
        );
    }

    #[tokio::test]
    async fn test_busy_is_503() {
        let response = ApiError::Busy { limit: 2 }.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(body_json(response).await["error"].as_str().unwrap().contains("2 running"));
    }

    #[test]
    fn test_internal_from_crate_error() {
        let err = ApiError::from(Error::Execution("worker 0 panicked".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("worker 0 panicked"));
    }
}
