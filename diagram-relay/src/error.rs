use crate::services::providers::ProviderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failure classes of a relay request.
///
/// Every variant renders as `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Backend error: {0}")]
    BackendError(String),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::BackendUnavailable(_) | RelayError::BackendError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::BadRequest(_) => "bad_request",
            RelayError::BackendUnavailable(_) => "backend_unavailable",
            RelayError::BackendError(_) => "backend_error",
        }
    }
}

impl From<ProviderError> for RelayError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Unavailable(_) => RelayError::BackendUnavailable(err.to_string()),
            ProviderError::Api { .. }
            | ProviderError::InvalidResponse(_)
            | ProviderError::ModelNotFound(_) => RelayError::BackendError(err.to_string()),
        }
    }
}

impl From<RelayError> for service_core::error::AppError {
    fn from(err: RelayError) -> Self {
        match err {
            RelayError::BackendUnavailable(msg) => {
                service_core::error::AppError::ServiceUnavailable(msg)
            }
            other => service_core::error::AppError::InternalError(anyhow::Error::new(other)),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
