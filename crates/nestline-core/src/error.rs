//! Unified error types for all layers of the data-access stack.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for all layers of Nestline.
///
/// This enum covers domain, storage, cache, and encryption errors.
/// Cache errors exist for the cache tier's internal plumbing only: the
/// service layer degrades them to misses, so callers never observe them.
#[derive(Error, Debug)]
pub enum NestlineError {
    // ============ Domain Errors ============
    /// Resource not found. Also returned when an ownership check fails,
    /// so callers cannot distinguish "absent" from "not yours".
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflict error (e.g., duplicate entry)
    #[error("Conflict: {0}")]
    Conflict(String),

    // ============ Encryption Errors ============
    /// A stored ciphertext could not be decrypted. Distinct from
    /// `NotFound`: the record exists but its content is unreadable.
    #[error("Decryption failed for {resource_type} with id {id}: {reason}")]
    Decryption {
        resource_type: &'static str,
        id: String,
        reason: String,
    },

    // ============ Infrastructure Errors ============
    /// Backing store error
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Cache tier error
    #[error("Cache error: {0}")]
    Cache(String),

    /// Timeout error
    #[error("Operation timed out: {0}")]
    Timeout(String),

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NestlineError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Validation(_) => 400,
            Self::Conflict(_) => 409,
            Self::Timeout(_) => 503,
            Self::Decryption { .. }
            | Self::Database(_)
            | Self::Configuration(_)
            | Self::Cache(_)
            | Self::Internal(_)
            | Self::Other(_) => 500,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Decryption { .. } => "DECRYPTION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Creates a not found error for a resource.
    #[must_use]
    pub fn not_found<T: ToString>(resource_type: &'static str, id: T) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict<T: Into<String>>(message: T) -> Self {
        Self::Conflict(message.into())
    }

    /// Creates a decryption error. The reason describes the cipher
    /// failure and never carries field content.
    #[must_use]
    pub fn decryption<I: ToString, R: Into<String>>(
        resource_type: &'static str,
        id: I,
        reason: R,
    ) -> Self {
        Self::Decryption {
            resource_type,
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }

    /// Checks if this error is retriable.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Cache(_) | Self::Timeout(_))
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for NestlineError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound {
                resource_type: "database_row",
                id: "unknown".to_string(),
            },
            sqlx::Error::Database(db_err) => {
                // Check for unique constraint violation
                if let Some(code) = db_err.code() {
                    if code == "23505" || code == "1062" {
                        // PostgreSQL / MySQL unique violation
                        return Self::Conflict(db_err.message().to_string());
                    }
                }
                Self::Database(err.to_string())
            }
            _ => Self::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for NestlineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON serialization error: {}", err))
    }
}

/// Serializable error response for callers embedding this layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional field-level errors for validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Field-level validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
}

impl ErrorResponse {
    /// Creates a new error response from a `NestlineError`.
    #[must_use]
    pub fn from_error(error: &NestlineError) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.to_string(),
            details: None,
        }
    }

    /// Sets field-level validation errors.
    #[must_use]
    pub fn with_details(mut self, details: Vec<FieldError>) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<&NestlineError> for ErrorResponse {
    fn from(error: &NestlineError) -> Self {
        Self::from_error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(NestlineError::not_found("Post", 1).status_code(), 404);
        assert_eq!(NestlineError::validation("bad limit").status_code(), 400);
        assert_eq!(NestlineError::conflict("duplicate vote").status_code(), 409);
        assert_eq!(NestlineError::Timeout("loader".to_string()).status_code(), 503);
        assert_eq!(NestlineError::Database("gone".to_string()).status_code(), 500);
        assert_eq!(NestlineError::internal("oops").status_code(), 500);
    }

    #[test]
    fn test_decryption_error_is_not_not_found() {
        let err = NestlineError::decryption("SessionRecord", "abc", "auth tag mismatch");
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_code(), "DECRYPTION_ERROR");
        assert_ne!(err.error_code(), NestlineError::not_found("SessionRecord", "abc").error_code());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(NestlineError::not_found("Post", 1).error_code(), "NOT_FOUND");
        assert_eq!(NestlineError::validation("bad").error_code(), "VALIDATION_ERROR");
        assert_eq!(NestlineError::conflict("dup").error_code(), "CONFLICT");
        assert_eq!(NestlineError::Cache("down".to_string()).error_code(), "CACHE_ERROR");
        assert_eq!(NestlineError::internal("err").error_code(), "INTERNAL_ERROR");
        assert_eq!(NestlineError::Timeout("t".to_string()).error_code(), "TIMEOUT");
    }

    #[test]
    fn test_retriable_errors() {
        assert!(NestlineError::Database("connection lost".to_string()).is_retriable());
        assert!(NestlineError::Cache("pool exhausted".to_string()).is_retriable());
        assert!(NestlineError::Timeout("loader timed out".to_string()).is_retriable());
    }

    #[test]
    fn test_non_retriable_errors() {
        assert!(!NestlineError::not_found("Post", 1).is_retriable());
        assert!(!NestlineError::validation("bad input").is_retriable());
        assert!(!NestlineError::conflict("dup").is_retriable());
        assert!(!NestlineError::decryption("SessionRecord", "abc", "bad tag").is_retriable());
    }

    #[test]
    fn test_error_constructors() {
        let not_found = NestlineError::not_found("Comment", "123");
        assert!(not_found.to_string().contains("Comment"));

        let validation = NestlineError::validation("limit out of range");
        assert!(validation.to_string().contains("limit out of range"));

        let conflict = NestlineError::conflict("duplicate entry");
        assert!(conflict.to_string().contains("duplicate entry"));

        let decryption = NestlineError::decryption("SessionRecord", "42", "truncated payload");
        assert!(decryption.to_string().contains("42"));
        assert!(decryption.to_string().contains("truncated payload"));
    }

    #[test]
    fn test_error_response_from_error() {
        let err = NestlineError::not_found("Post", 1);
        let response = ErrorResponse::from_error(&err);
        assert_eq!(response.code, "NOT_FOUND");
        assert!(!response.message.is_empty());
        assert!(response.details.is_none());
    }

    #[test]
    fn test_error_response_with_details() {
        let err = NestlineError::validation("bad input");
        let details = vec![FieldError {
            field: "title".to_string(),
            message: "must not be blank".to_string(),
            code: "not_blank".to_string(),
        }];
        let response = ErrorResponse::from_error(&err).with_details(details);
        assert!(response.details.is_some());
        assert_eq!(response.details.unwrap().len(), 1);
    }

    #[test]
    fn test_error_response_from_ref() {
        let err = NestlineError::not_found("Post", 42);
        let response: ErrorResponse = ErrorResponse::from(&err);
        assert_eq!(response.code, "NOT_FOUND");
    }
}
