//! Backend Module
//!
//! Axum server for the chat application: accounts, chat history over REST
//! and live message delivery over WebSocket.
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── server/      - Configuration, AppState, initialization
//! ├── routes/      - Router assembly
//! ├── realtime/    - Connection registry, delivery coordinator, WebSocket sessions
//! ├── chat/        - Message store trait, Postgres and in-memory stores, chat REST
//! ├── auth/        - Users, sessions, signup verification, mail
//! ├── users.rs     - Users REST
//! ├── middleware/  - Identity middleware and extractor
//! └── error/       - BackendError
//! ```
//!
//! # State Management
//!
//! `AppState` owns everything shared between requests: the optional database
//! pool, session keys, the delivery coordinator (connection registry plus
//! message store) and pending signups. Handlers extract the pieces they need
//! through `FromRef`.
//!
//! # Example
//!
//! ```rust,no_run
//! use chatline::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() -> std::io::Result<()> {
//! let app = create_app(ServerConfig::default()).await;
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await
//! # }
//! ```

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Chat persistence and REST handlers
pub mod chat;

/// Live message delivery
pub mod realtime;

/// Backend error types
pub mod error;

/// Authentication and user management
pub mod auth;

/// Users REST handlers
pub mod users;

/// Middleware for request processing
pub mod middleware;

pub use error::BackendError;
pub use server::create_app;
