//! Shared Module
//!
//! Wire-level types exchanged with chat clients over the WebSocket endpoint
//! and the JSON API. Nothing in here touches the database or the network, so
//! these types can be reused by a Rust client as-is.

/// Chat message and delivery status payloads
pub mod message;

/// Shared error types
pub mod error;

pub use error::SharedError;
pub use message::{ChatMessage, DeliveryStatus, MessageStatus, ServerFrame};
