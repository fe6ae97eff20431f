//! Connection lifecycle.
//!
//! [`run_session`] drives one authenticated connection from registration to
//! cleanup. It only sees a stream of [`Inbound`] events, so the same state
//! machine runs behind the axum WebSocket adapter and in tests.
//!
//! ```text
//! register (closes any older connection of the user)
//!    │
//!    ▼
//! replay undelivered messages
//!    │
//!    ▼
//! receive loop ── text/binary ──► decode ──ok──► DeliveryCoordinator::deliver
//!    │                               └──err──► close 1003, exit
//!    ├── close frame ──► exit (graceful)
//!    └── error / end of stream ──► exit (unexpected)
//!    │
//!    ▼
//! remove_connection (only if still registered)
//! ```

use futures_util::{Stream, StreamExt};
use tracing::{debug, info, warn};

use super::connection::{Connection, CLOSE_MALFORMED};
use super::coordinator::DeliveryCoordinator;
use crate::shared::{ChatMessage, SharedError};

/// Close reason sent with [`CLOSE_MALFORMED`]
pub const MALFORMED_REASON: &str = "malformed message";

/// One event read from the client side of a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Text(String),
    Binary(Vec<u8>),
    /// The client sent a close frame
    Close,
    /// The transport failed
    Error(String),
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Client closed the connection
    Graceful,
    /// Transport error or the stream ended without a close frame
    Unexpected,
    /// Client sent a frame that could not be decoded
    Malformed,
}

/// Run an authenticated connection until it ends
///
/// Inbound messages are handled strictly one after the other, in arrival
/// order. The connection is deregistered on every exit path.
pub async fn run_session(
    coordinator: &DeliveryCoordinator,
    connection: Connection,
    incoming: impl Stream<Item = Inbound>,
) -> SessionEnd {
    let user_id = connection.user_id();
    let conn_id = connection.id();
    let registry = coordinator.registry();

    registry.register(connection.clone());
    info!(%user_id, %conn_id, live = registry.len(), "Chat connection opened");

    coordinator.replay_undelivered(&connection).await;

    let mut incoming = std::pin::pin!(incoming);
    let end = loop {
        let decoded = match incoming.next().await {
            Some(Inbound::Text(text)) => ChatMessage::from_json(&text),
            Some(Inbound::Binary(bytes)) => ChatMessage::from_json_bytes(&bytes),
            Some(Inbound::Close) => break SessionEnd::Graceful,
            Some(Inbound::Error(e)) => {
                warn!(%conn_id, error = %e, "Chat connection failed");
                break SessionEnd::Unexpected;
            }
            None => break SessionEnd::Unexpected,
        };

        match decoded {
            Ok(message) => {
                let outcome = coordinator.deliver(&connection, message).await;
                debug!(%conn_id, ?outcome, "Inbound message handled");
            }
            Err(SharedError::Malformed { reason } | SharedError::InvalidField { message: reason, .. }) => {
                warn!(%conn_id, %reason, "Closing connection after malformed message");
                connection.close(CLOSE_MALFORMED, MALFORMED_REASON);
                break SessionEnd::Malformed;
            }
        }
    };

    let removed = registry.remove_connection(user_id, conn_id);
    info!(%user_id, %conn_id, ?end, removed, "Chat connection closed");
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::chat::memory::MemoryMessageStore;
    use crate::backend::realtime::connection::Outbound;
    use crate::backend::realtime::registry::ConnectionRegistry;
    use futures_util::stream;
    use std::sync::Arc;
    use uuid::Uuid;

    fn coordinator() -> DeliveryCoordinator {
        DeliveryCoordinator::new(
            Arc::new(ConnectionRegistry::new()),
            Arc::new(MemoryMessageStore::new()),
        )
    }

    #[tokio::test]
    async fn test_graceful_close_deregisters() {
        let coordinator = coordinator();
        let (connection, _rx) = Connection::new(Uuid::new_v4());

        let end = run_session(&coordinator, connection, stream::iter([Inbound::Close])).await;

        assert_eq!(end, SessionEnd::Graceful);
        assert!(coordinator.registry().is_empty());
    }

    #[tokio::test]
    async fn test_stream_end_is_unexpected() {
        let coordinator = coordinator();
        let (connection, _rx) = Connection::new(Uuid::new_v4());

        let end = run_session(&coordinator, connection, stream::empty()).await;

        assert_eq!(end, SessionEnd::Unexpected);
        assert!(coordinator.registry().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_frame_closes_connection() {
        let coordinator = coordinator();
        let (connection, mut rx) = Connection::new(Uuid::new_v4());
        let frames = [
            Inbound::Binary(b"{\"message\": 1}".to_vec()),
            Inbound::Text("never read".into()),
        ];

        let end = run_session(&coordinator, connection, stream::iter(frames)).await;

        assert_eq!(end, SessionEnd::Malformed);
        match rx.try_recv() {
            Ok(Outbound::Close { code, reason }) => {
                assert_eq!(code, CLOSE_MALFORMED);
                assert_eq!(reason, MALFORMED_REASON);
            }
            other => panic!("expected close, got {other:?}"),
        }
        assert!(coordinator.registry().is_empty());
    }
}
