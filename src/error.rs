//! Unified API error handling
//!
//! Provides consistent error responses across all endpoints, including the
//! relay of provider status codes through the encoding gateway.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::coordinator::UpsertError;
use crate::services::encoder::EncodingError;
use crate::services::storage::StorageError;
use crate::services::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Provider-reported: the image contains no detectable face.
    #[error("No face detected: {0}")]
    NoFaceDetected(String),

    /// Provider-reported: the image contains more than one face.
    #[error("Multiple faces detected: {0}")]
    MultipleFacesDetected(String),

    #[error("Gateway timeout: {0}")]
    GatewayTimeout(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Failure relayed from a downstream service (face provider, object
    /// store), preserving its status code where one exists.
    #[error("Upstream error ({status}): {message}")]
    Upstream { status: StatusCode, message: String },

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NoFaceDetected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::MultipleFacesDetected(_) => StatusCode::BAD_REQUEST,
            Self::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Upstream { status, .. } => *status,
            Self::Configuration(_) | Self::Internal(_) | Self::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::NoFaceDetected(_) => "NO_FACE_DETECTED",
            Self::MultipleFacesDetected(_) => "MULTIPLE_FACES_DETECTED",
            Self::GatewayTimeout(_) => "GATEWAY_TIMEOUT",
            Self::Upstream { .. } => "UPSTREAM_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::BadRequest(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg)
            | Self::NoFaceDetected(msg)
            | Self::MultipleFacesDetected(msg)
            | Self::GatewayTimeout(msg)
            | Self::Configuration(msg) => msg.clone(),
            Self::Upstream { message, .. } => message.clone(),
            // Don't leak internal error details
            Self::Internal(_) | Self::Database(_) => "An internal error occurred".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(e) => {
                tracing::error!(error = ?e, "Internal server error");
            }
            Self::Database(e) => {
                tracing::error!(error = ?e, "Database error");
            }
            _ => {
                tracing::warn!(error = %self, "API error");
            }
        }

        let status = self.status_code();
        let body = ErrorResponse {
            code: self.error_code().to_string(),
            message: self.public_message(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<EncodingError> for ApiError {
    fn from(err: EncodingError) -> Self {
        match err {
            EncodingError::NoFaceDetected => Self::NoFaceDetected(
                "No face detected in the image. Use a clear photo of a single face.".to_string(),
            ),
            EncodingError::MultipleFacesDetected => Self::MultipleFacesDetected(
                "Multiple faces detected in the image. Use a photo with exactly one face."
                    .to_string(),
            ),
            EncodingError::Timeout => Self::GatewayTimeout(
                "Request timeout - face recognition service took too long to respond".to_string(),
            ),
            EncodingError::Configuration => Self::Configuration(
                "Face recognition service is not properly configured".to_string(),
            ),
            EncodingError::Provider { status, message } => Self::Upstream {
                status: status
                    .and_then(|s| StatusCode::from_u16(s).ok())
                    .unwrap_or(StatusCode::BAD_GATEWAY),
                message,
            },
            EncodingError::InvalidPayload(msg) => Self::Upstream {
                status: StatusCode::BAD_GATEWAY,
                message: format!("Face recognition service returned an invalid payload: {msg}"),
            },
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self::Upstream {
            status: StatusCode::BAD_GATEWAY,
            message: format!("Image storage error: {err}"),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(format!("Profile {id} not found")),
            StoreError::Database(e) => Self::Database(e),
        }
    }
}

impl From<UpsertError> for ApiError {
    fn from(err: UpsertError) -> Self {
        match err {
            UpsertError::Validation(msg) => Self::BadRequest(msg),
            UpsertError::NotFound(id) => Self::NotFound(format!("Profile {id} not found")),
            UpsertError::Upload(e) => e.into(),
            UpsertError::Encoding(e) => e.into(),
            UpsertError::Store(e) => e.into(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_conditions_keep_distinct_error_codes() {
        let err: ApiError = EncodingError::NoFaceDetected.into();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error_code(), "NO_FACE_DETECTED");

        let err: ApiError = EncodingError::MultipleFacesDetected.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "MULTIPLE_FACES_DETECTED");

        // A plain bad request stays distinguishable from the face condition
        let err = ApiError::BadRequest("Image URL is required".to_string());
        assert_eq!(err.error_code(), "BAD_REQUEST");
    }

    #[test]
    fn timeout_maps_to_gateway_timeout() {
        let err: ApiError = EncodingError::Timeout.into();
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(err.error_code(), "GATEWAY_TIMEOUT");
    }

    #[test]
    fn configuration_error_carries_specific_guidance() {
        let err: ApiError = EncodingError::Configuration.into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
        assert!(err.public_message().contains("not properly configured"));
    }

    #[test]
    fn provider_status_is_preserved() {
        let err: ApiError = EncodingError::Provider {
            status: Some(503),
            message: "model is loading".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.error_code(), "UPSTREAM_ERROR");
        assert_eq!(err.public_message(), "model is loading");
    }
}
