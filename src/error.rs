//! Error taxonomy: one `thiserror` enum per layer, composed into the
//! HTTP-facing [`AppError`] via a "per-subsystem enum with `#[from]`
//! leaves" convention.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Errors from the relational store and advisory-lock layer.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// Errors from the key-value store.
#[derive(Debug, Error)]
pub enum KvError {
    #[error("redis connection failed: {0}")]
    Connection(String),

    #[error("redis command failed: {0}")]
    Command(String),

    #[error("redis command timed out")]
    Timeout,

    #[error("payload codec error: {0}")]
    Codec(String),
}

/// Behavioral taxonomy used by use-case services and the HTTP layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rate limited")]
    RateLimited,

    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("operation cancelled or timed out")]
    Transient,

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl From<DbError> for ServiceError {
    fn from(e: DbError) -> Self {
        ServiceError::DependencyUnavailable(e.to_string())
    }
}

impl From<KvError> for ServiceError {
    fn from(e: KvError) -> Self {
        ServiceError::DependencyUnavailable(e.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServiceError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServiceError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ServiceError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate limited".to_string()),
            ServiceError::DependencyUnavailable(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            ServiceError::Transient => (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string()),
            ServiceError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string()),
        };

        if matches!(
            self,
            ServiceError::DependencyUnavailable(_) | ServiceError::Internal(_) | ServiceError::Transient
        ) {
            tracing::error!(error = %self, "request failed");
        }

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
