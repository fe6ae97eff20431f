//! chatline
//!
//! A chat backend with live delivery. Clients connect over WebSocket, send
//! `{to, message}` frames and receive delivery notices for what they sent and
//! pushes for what they are sent. Messages are persisted first, so recipients
//! who are offline get them replayed when they reconnect.
//!
//! # Module Structure
//!
//! - **`shared`** - Wire types (`ChatMessage`, `MessageStatus`, `ServerFrame`)
//!   and their error type
//! - **`backend`** - Axum server: realtime delivery, chat storage, accounts
//!
//! # Usage
//!
//! ```rust,no_run
//! use chatline::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::load(None)?;
//! let app = create_app(config).await;
//! // Serve `app` with axum::serve
//! # Ok(())
//! # }
//! ```

/// Shared wire types
pub mod shared;

/// Backend server-side code
pub mod backend;
