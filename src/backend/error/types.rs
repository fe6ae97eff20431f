/**
 * Backend Error Types
 *
 * Errors returned by HTTP handlers. Every variant maps to a status code and a
 * message; `conversion.rs` turns them into JSON responses.
 *
 * # Error Categories
 *
 * - Request errors: `HandlerError`, `FieldErrors`, `Unauthorized`, `Forbidden`, `NotFound`
 * - Service errors: `ServiceUnavailable` (no database configured)
 * - Wrapped lower-layer errors: storage, sqlx, JWT, mail, wire decoding
 */

use std::collections::BTreeMap;

use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::auth::mail::MailError;
use crate::backend::chat::store::StorageError;
use crate::shared::SharedError;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use chatline::backend::error::BackendError;
/// use axum::http::StatusCode;
///
/// let err = BackendError::handler(StatusCode::BAD_REQUEST, "Invalid request");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
///
/// let err = BackendError::field("email", "Email does not exist");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Error with an explicit status code
    #[error("Handler error: {message}")]
    HandlerError {
        status: StatusCode,
        message: String,
    },

    /// One or more request fields failed validation (400)
    #[error("Validation failed")]
    FieldErrors {
        /// Field name → message
        fields: BTreeMap<String, String>,
    },

    /// No verified identity on the request (401)
    #[error("Authentication required")]
    Unauthorized,

    /// Identity present but not allowed (403)
    #[error("Access denied")]
    Forbidden,

    /// Resource missing or not visible to the caller (404)
    #[error("{0} not found")]
    NotFound(String),

    /// A backing service is not configured (503)
    #[error("{0} not configured")]
    ServiceUnavailable(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing error: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error(transparent)]
    Mail(#[from] MailError),

    #[error(transparent)]
    SharedError(#[from] SharedError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// Create a validation error for a single field
    pub fn field(name: impl Into<String>, message: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(name.into(), message.into());
        Self::FieldErrors { fields }
    }

    /// Create a validation error from collected field messages
    ///
    /// Returns `None` when `fields` is empty.
    pub fn fields(fields: BTreeMap<String, String>) -> Option<Self> {
        (!fields.is_empty()).then_some(Self::FieldErrors { fields })
    }

    /// Shorthand for a missing database
    pub fn no_database() -> Self {
        Self::ServiceUnavailable("Database".to_string())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::FieldErrors { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::Token(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) | Self::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::ServiceUnavailable(_) | Self::Storage(StorageError::Unavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::SharedError(_) => StatusCode::BAD_REQUEST,
            Self::Storage(StorageError::Database(_))
            | Self::Database(_)
            | Self::Hashing(_)
            | Self::Mail(_)
            | Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the message exposed to clients
    ///
    /// Internal failures are reported generically; the details go to the log.
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::Token(_) => "Invalid or expired token".to_string(),
            Self::Storage(StorageError::Database(_))
            | Self::Database(_)
            | Self::Hashing(_)
            | Self::Mail(_)
            | Self::SerializationError(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Per-field messages, if this is a validation error
    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::FieldErrors { fields } => Some(fields),
            _ => None,
        }
    }
}
