//! Shared Error Types
//!
//! Errors raised while decoding or validating wire payloads. The backend wraps
//! them in `BackendError` for HTTP responses; the WebSocket session uses them to
//! decide when an inbound frame is malformed.
//!
//! # Usage
//!
//! ```rust
//! use chatline::shared::error::SharedError;
//!
//! let error = SharedError::invalid_field("message", "must not be empty");
//! assert!(error.to_string().contains("message"));
//! ```
use thiserror::Error;

/// Errors produced by shared wire types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// The payload could not be decoded into the expected shape
    #[error("Malformed payload: {reason}")]
    Malformed {
        /// Decoder message
        reason: String,
    },

    /// A decoded payload carried an unacceptable value
    #[error("Invalid value for '{field}': {message}")]
    InvalidField {
        /// Name of the offending field, as it appears on the wire
        field: String,
        /// Human-readable explanation
        message: String,
    },
}

impl SharedError {
    /// Create a malformed payload error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    /// Create an invalid field error
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The wire field this error refers to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidField { field, .. } => Some(field),
            Self::Malformed { .. } => None,
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_from_serde_error() {
        let err = serde_json::from_str::<serde_json::Value>("{ not json").unwrap_err();
        let shared: SharedError = err.into();
        assert!(matches!(shared, SharedError::Malformed { .. }));
        assert!(shared.field().is_none());
    }

    #[test]
    fn test_invalid_field_display() {
        let error = SharedError::invalid_field("to", "unknown recipient");
        assert_eq!(error.field(), Some("to"));
        assert_eq!(error.to_string(), "Invalid value for 'to': unknown recipient");
    }
}
