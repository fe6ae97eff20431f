//! Chat Backend Module
//!
//! Persistence and REST access for two-party chats.
//!
//! # Architecture
//!
//! - **`store`** - `MessageStore` trait and the chat/message types it returns
//! - **`db`** - PostgreSQL implementation
//! - **`memory`** - in-process implementation used without a database
//! - **`handlers`** - `/api/chats` endpoints
//!
//! Live delivery lives in `backend::realtime`, which writes through the same
//! store.
//!
//! # Example
//!
//! ```rust,no_run
//! use chatline::backend::chat::{MemoryMessageStore, MessageStore, NewMessage};
//! use uuid::Uuid;
//!
//! # async fn example() -> Result<(), chatline::backend::chat::StorageError> {
//! let store = MemoryMessageStore::new();
//! let saved = store
//!     .save(&NewMessage { from: Uuid::new_v4(), to: Uuid::new_v4(), body: "hi".into() })
//!     .await?;
//! store.mark_delivered(saved.id).await?;
//! # Ok(())
//! # }
//! ```

/// Store trait and types
pub mod store;

/// PostgreSQL message store
pub mod db;

/// In-memory message store
pub mod memory;

/// HTTP handlers
pub mod handlers;

pub use db::PgMessageStore;
pub use memory::MemoryMessageStore;
pub use store::{Chat, MessageStore, NewMessage, Page, SavedMessage, StorageError, StoredMessage};
