//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Registry errors keep their own machine-readable code on the wire
//! (`NOT_AUTHORIZED`, `PRODUCT_NOT_FOUND`, ...); transport-level failures use
//! the generic codes. Storage faults and other internal errors never expose
//! their message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use twin_state::RegistryError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. "PRODUCT_NOT_FOUND").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// A registry operation failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Registry(err) => {
                let status = match err {
                    RegistryError::NotAuthorized { .. } => StatusCode::FORBIDDEN,
                    RegistryError::ProductNotFound(_) => StatusCode::NOT_FOUND,
                    RegistryError::AlreadyExists(_) => StatusCode::CONFLICT,
                    RegistryError::InvalidStatus(_) | RegistryError::Validation(_) => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    RegistryError::TransitionRejected { .. } => StatusCode::CONFLICT,
                    RegistryError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.code())
            }
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Internal(_) | Self::Registry(RegistryError::Storage(_))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if self.is_internal() {
            tracing::error!(error = %self, "internal server error");
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Convert twin-core validation errors (bad path ids, timestamps) to API errors.
impl From<twin_core::ValidationError> for AppError {
    fn from(err: twin_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use twin_core::{Principal, ProductId};
    use twin_state::{Action, ProductStatus, StorageError};

    fn pid() -> ProductId {
        ProductId::new("P1").unwrap()
    }

    #[test]
    fn registry_errors_map_to_statuses() {
        let cases = [
            (
                RegistryError::NotAuthorized {
                    caller: Principal::new("m").unwrap(),
                    action: Action::Transfer,
                },
                StatusCode::FORBIDDEN,
                "NOT_AUTHORIZED",
            ),
            (
                RegistryError::ProductNotFound(pid()),
                StatusCode::NOT_FOUND,
                "PRODUCT_NOT_FOUND",
            ),
            (
                RegistryError::AlreadyExists(pid()),
                StatusCode::CONFLICT,
                "ALREADY_EXISTS",
            ),
            (
                RegistryError::InvalidStatus(6),
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_STATUS",
            ),
            (
                RegistryError::TransitionRejected {
                    from: ProductStatus::Retired,
                    to: ProductStatus::Manufactured,
                },
                StatusCode::CONFLICT,
                "TRANSITION_REJECTED",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(AppError::from(err).status_and_code(), (status, code));
        }
    }

    #[test]
    fn transport_errors_map_to_generic_codes() {
        assert_eq!(
            AppError::BadRequest("x".into()).status_and_code(),
            (StatusCode::BAD_REQUEST, "BAD_REQUEST")
        );
        assert_eq!(
            AppError::Unauthorized("x".into()).status_and_code(),
            (StatusCode::UNAUTHORIZED, "UNAUTHORIZED")
        );
        assert_eq!(
            AppError::Validation("x".into()).status_and_code(),
            (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
        );
    }

    #[tokio::test]
    async fn storage_fault_message_is_hidden() {
        let err = AppError::from(RegistryError::Storage(StorageError::Encode(
            "secret path /var/lib/twin".into(),
        )));
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "STORAGE_ERROR");
        assert_eq!(json["error"]["message"], "An internal error occurred");
        assert!(json["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn client_error_body_carries_message() {
        let resp = AppError::from(RegistryError::ProductNotFound(pid())).into_response();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "PRODUCT_NOT_FOUND");
        assert_eq!(json["error"]["message"], "product P1 not found");
    }
}
