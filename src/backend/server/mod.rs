//! Server Module
//!
//! Initialization and configuration of the Axum HTTP server.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── state.rs   - AppState and FromRef implementations
//! ├── config.rs  - ServerConfig, environment/TOML loading, database connection
//! └── init.rs    - App creation and background tasks
//! ```

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

pub use config::ServerConfig;
pub use init::create_app;
pub use state::AppState;
