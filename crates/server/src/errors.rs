use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::{auth::errors::AuthError, errors::ServiceError};
use thiserror::Error;
use tracing::error;

/// JSON error response: `{"error": "<message>"}` with the given status.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub message: String,
}

impl JsonApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({"error": self.message}))).into_response()
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            ServiceError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, msg),
            ServiceError::Storage(msg) => {
                error!(err = %msg, "claim storage failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Storage Error")
            }
        }
    }
}

impl From<AuthError> for JsonApiError {
    fn from(err: AuthError) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("runtime check failed: {0}")]
    Runtime(String),
}
