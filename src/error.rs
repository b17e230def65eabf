//! Error taxonomy for the request path.
//!
//! Startup plumbing uses `anyhow`; anything that can reach a client goes
//! through [`ServiceError`] so it maps onto a stable status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the model holder and the request handlers.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The model artifact could not be read or is not a usable classifier
    #[error("failed to load model from {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    /// A request arrived before the model finished loading
    #[error("Model not loaded")]
    NotLoaded,

    /// Client input failed shape or numeric checks
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The loaded model failed while scoring a request
    #[error("inference failed: {0}")]
    Inference(anyhow::Error),

    /// Blocking work could not be joined
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotLoaded => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Load { .. } | ServiceError::Inference(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Reasons a candidate feature list is rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("expected {expected} features, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("Features cannot contain NaN or Inf (index {index})")]
    NonFinite { index: usize },

    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

/// Body returned for every non-2xx response except readiness.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServiceError::NotLoaded.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ServiceError::from(ValidationError::NonFinite { index: 1 }).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::Internal("join".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_messages() {
        let err = ValidationError::WrongLength {
            expected: 4,
            actual: 3,
        };
        assert_eq!(err.to_string(), "expected 4 features, got 3");
    }
}
