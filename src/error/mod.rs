//! Error handling module.
//!
//! This module provides unified error handling with proper HTTP status code mapping
//! and standardized API error responses.

pub mod codes;
pub mod engine;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

pub use codes::ErrorCode;
pub use engine::{EngineError, FieldError};

/// Application-level error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No ID configuration stored for the inventory.
    #[error("Configuration not found: {0}")]
    ConfigNotFound(String),

    /// Configuration failed validation.
    #[error("Invalid configuration: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    /// Rendering failed.
    #[error("Render failed: {0}")]
    Render(FieldError),

    /// Invalid request parameters.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

fn summarize(errors: &[FieldError]) -> String {
    match errors {
        [] => "no details".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}

impl AppError {
    /// Get the error code for this error.
    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::ConfigNotFound(_) => ErrorCode::CONFIG_NOT_FOUND,
            Self::Validation(errors) => errors
                .first()
                .map_or(ErrorCode::INVALID_CONFIG, |e| e.error.error_code()),
            Self::Render(err) => err.error.error_code(),
            Self::BadRequest(_) => ErrorCode::BAD_REQUEST,
            Self::NotFound(_) => ErrorCode::NOT_FOUND,
            Self::Storage(_) => ErrorCode::STORAGE_ERROR,
        }
    }

    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ConfigNotFound(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Render(err) => match err.error {
                EngineError::AllocationUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Value {
        match self {
            Self::Validation(errors) => {
                Value::Array(errors.iter().map(FieldError::to_json).collect())
            }
            Self::Render(err) => Value::Array(vec![err.to_json()]),
            _ => Value::Null,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let code = error_code.as_i32();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(
                error_code = code,
                category = %error_code.category(),
                status = %status,
                message = %message,
                "Request failed"
            );
        } else {
            tracing::debug!(
                error_code = code,
                category = %error_code.category(),
                status = %status,
                message = %message,
                "Request rejected"
            );
        }

        let body = Json(json!({
            "code": code,
            "message": message,
            "data": self.details()
        }));

        (status, body).into_response()
    }
}

/// Storage-specific error type.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Connection error.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Query execution error.
    #[error("Query failed: {0}")]
    Query(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Lock acquisition failed.
    #[error("Failed to acquire lock: {0}")]
    LockFailed(String),

    /// File I/O error.
    #[error("File I/O error: {0}")]
    FileIO(String),

    /// Counter would overflow its integer range.
    #[error("Sequence overflow for inventory: {0}")]
    Overflow(String),

    /// Backend not available.
    #[error("Storage backend unavailable")]
    Unavailable,
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::FileIO(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Connection(err.to_string())
            }
            other => Self::Query(other.to_string()),
        }
    }
}

impl From<redis::RedisError> for StorageError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error() {
            Self::Connection(err.to_string())
        } else {
            Self::Query(err.to_string())
        }
    }
}

impl From<deadpool_redis::PoolError> for StorageError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        Self::Connection(err.to_string())
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias using `StorageError`.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ElementField;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::ConfigNotFound("inv-1".to_string()).error_code(),
            ErrorCode::CONFIG_NOT_FOUND
        );
        assert_eq!(
            AppError::Validation(vec![FieldError::global(EngineError::TooManyElements {
                count: 11,
                max: 10
            })])
            .error_code(),
            ErrorCode::TOO_MANY_ELEMENTS
        );
        assert_eq!(
            AppError::Validation(vec![]).error_code(),
            ErrorCode::INVALID_CONFIG
        );
        assert_eq!(
            AppError::Storage(StorageError::Unavailable).error_code(),
            ErrorCode::STORAGE_ERROR
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::ConfigNotFound("inv-1".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Render(FieldError::global(EngineError::AllocationUnavailable(
                "down".to_string()
            )))
            .status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Render(FieldError::global(EngineError::EmptyConfiguration)).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_validation_message_summarizes() {
        let err = AppError::Validation(vec![
            FieldError::at(
                0,
                ElementField::Value,
                EngineError::MissingRequiredValue(ElementField::Value),
            ),
            FieldError::global(EngineError::TooManyElements { count: 12, max: 10 }),
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid configuration: element 0 value: missing required value (and 1 more)"
        );
    }
}
