//! Connection registry.
//!
//! Maps a user id to that user's single live connection. Registering a second
//! connection for the same user closes the first one. Owned by the application
//! state and shared by reference, there is no process-wide instance.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use super::connection::{Connection, ConnectionId, CLOSE_SUPERSEDED};

/// Close reason sent along with [`CLOSE_SUPERSEDED`]
pub const SUPERSEDED_REASON: &str = "superseded by a newer connection";

/// User id → live connection
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<Uuid, Connection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Connection>> {
        self.connections.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `connection` as its user's live connection
    ///
    /// Any connection previously registered for the user is closed with
    /// [`CLOSE_SUPERSEDED`] before this returns.
    pub fn register(&self, connection: Connection) {
        let user_id = connection.user_id();
        let id = connection.id();
        let mut connections = self.lock();
        if let Some(previous) = connections.insert(user_id, connection) {
            if previous.id() != id {
                tracing::info!(
                    %user_id,
                    old = %previous.id(),
                    new = %id,
                    "Replacing live connection"
                );
                previous.close(CLOSE_SUPERSEDED, SUPERSEDED_REASON);
            }
        }
    }

    /// The user's live connection, if any
    pub fn get(&self, user_id: Uuid) -> Option<Connection> {
        self.lock().get(&user_id).cloned()
    }

    /// Forget the user's connection; a no-op if none is registered
    pub fn remove(&self, user_id: Uuid) -> Option<Connection> {
        self.lock().remove(&user_id)
    }

    /// Forget the user's connection only if it is still `connection_id`
    ///
    /// Returns `false` when the slot is empty or already holds a newer
    /// connection, which is then left untouched.
    pub fn remove_connection(&self, user_id: Uuid, connection_id: ConnectionId) -> bool {
        let mut connections = self.lock();
        match connections.get(&user_id) {
            Some(current) if current.id() == connection_id => {
                connections.remove(&user_id);
                true
            }
            _ => false,
        }
    }

    /// Number of live connections
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::realtime::connection::Outbound;

    #[test]
    fn test_register_and_get() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let (connection, _rx) = Connection::new(user);
        let id = connection.id();

        registry.register(connection);

        assert_eq!(registry.get(user).map(|c| c.id()), Some(id));
        assert!(registry.get(Uuid::new_v4()).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_closes_superseded_connection() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let (old, mut old_rx) = Connection::new(user);
        let (new, mut new_rx) = Connection::new(user);
        let new_id = new.id();

        registry.register(old);
        registry.register(new);

        match old_rx.try_recv() {
            Ok(Outbound::Close { code, reason }) => {
                assert_eq!(code, CLOSE_SUPERSEDED);
                assert_eq!(reason, SUPERSEDED_REASON);
            }
            other => panic!("expected close, got {other:?}"),
        }
        assert!(new_rx.try_recv().is_err());
        assert_eq!(registry.get(user).map(|c| c.id()), Some(new_id));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reregistering_same_connection_does_not_close_it() {
        let registry = ConnectionRegistry::new();
        let (connection, mut rx) = Connection::new(Uuid::new_v4());
        registry.register(connection.clone());
        registry.register(connection);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let (connection, _rx) = Connection::new(user);
        registry.register(connection);

        assert!(registry.remove(user).is_some());
        assert!(registry.remove(user).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_stale_cleanup_keeps_newer_connection() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let (old, _old_rx) = Connection::new(user);
        let (new, _new_rx) = Connection::new(user);
        let (old_id, new_id) = (old.id(), new.id());

        registry.register(old);
        registry.register(new);

        assert!(!registry.remove_connection(user, old_id));
        assert_eq!(registry.get(user).map(|c| c.id()), Some(new_id));
        assert!(registry.remove_connection(user, new_id));
        assert!(registry.get(user).is_none());
    }
}
