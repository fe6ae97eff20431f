//! Middleware Module
//!
//! - **`auth`** - identity middleware and the `AuthUser` extractor

pub mod auth;

pub use auth::{identity_guard, AuthUser, AuthenticatedUser};
