//! Route Configuration Module
//!
//! - **`router`** - Main router creation, layers and SPA fallback
//! - **`chat_routes`** - `/api/chats` and the WebSocket endpoint
//! - **`api_routes`** - `/api/auth` and `/api/users`

pub mod router;

pub mod chat_routes;

pub mod api_routes;

pub use router::create_router;
