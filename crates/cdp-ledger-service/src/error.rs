//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use cdp_ledger_core::LedgerError;
use cdp_ledger_store::StoreError;

/// API error type.
///
/// Authorization failures and ledger rule violations both map to
/// `403 Forbidden`; callers tell them apart by the message only.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("could not validate credentials")]
    Unauthorized,

    /// Forbidden - insufficient permissions or a rejected ledger operation.
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Conflict - resource already exists.
    #[error("{0}")]
    Conflict(String),

    /// Malformed or invalid input.
    #[error("{0}")]
    Validation(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// The generic authorization failure.
    #[must_use]
    pub fn not_allowed() -> Self {
        Self::Forbidden("you are not allowed".into())
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "could not validate credentials".to_string(),
            ),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let mut response = (status, Json(ErrorResponse { message })).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match &err {
            LedgerError::Validation { .. } => Self::Validation(err.to_string()),
            LedgerError::OverThreshold { .. } => {
                tracing::info!(error = %err, "Payback rejected");
                Self::Forbidden("you are paying back more than the threshold of this code".into())
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound(format!("{entity} {id} not found")),
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::Ledger(err) => err.into(),
            StoreError::Database(msg) => Self::Internal(msg),
        }
    }
}
