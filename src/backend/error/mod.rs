//! Backend Error Module
//!
//! `BackendError` is the error type of every HTTP handler. It converts into a
//! JSON response carrying the status code and message.
//!
//! ```rust,no_run
//! use chatline::backend::error::BackendError;
//! use axum::Json;
//!
//! async fn handler() -> Result<Json<&'static str>, BackendError> {
//!     Err(BackendError::Forbidden)
//! }
//! ```

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

pub use types::BackendError;
