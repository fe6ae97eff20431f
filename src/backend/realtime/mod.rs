//! Real-time chat delivery
//!
//! Everything between an upgraded WebSocket and the message store.
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── connection.rs   - Connection handle, outbound queue, ids
//! ├── registry.rs     - User id → live connection
//! ├── coordinator.rs  - Persist, acknowledge, push, mark delivered
//! ├── session.rs      - Transport-independent connection lifecycle
//! └── socket.rs       - axum WebSocket adapter
//! ```
//!
//! # Ordering
//!
//! Messages from one connection are handled strictly in arrival order. A push
//! to a recipient completes its socket write before the sender is told the
//! message was delivered.

pub mod connection;
pub mod coordinator;
pub mod registry;
pub mod session;
pub mod socket;

pub use connection::{Connection, ConnectionId, Outbound, PushError};
pub use coordinator::{DeliveryCoordinator, DeliveryFailure, DeliveryOutcome};
pub use registry::ConnectionRegistry;
pub use session::{run_session, Inbound, SessionEnd};
pub use socket::chat_socket;
