//! Live connection handle.
//!
//! A [`Connection`] is the sending half of one user's WebSocket. The socket
//! task owns the receiving half ([`Outbound`] queue) and writes every queued
//! item to the wire in order. Handles are cheap to clone and are what the
//! registry stores.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::shared::{ChatMessage, ServerFrame};

/// Close code sent to a connection replaced by a newer one for the same user
pub const CLOSE_SUPERSEDED: u16 = 4000;

/// Close code for frames that cannot be decoded (RFC 6455 "unsupported data")
pub const CLOSE_MALFORMED: u16 = 1003;

/// Unique connection identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generates a new unique connection ID.
    pub fn generate() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Why a frame could not be written
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PushError {
    /// The socket task is gone; nothing more can be written
    #[error("connection closed")]
    Closed,

    /// The transport reported a write failure
    #[error("write failed: {0}")]
    Write(String),
}

/// Acknowledgement channel completed once a frame hit the transport
pub type WriteAck = oneshot::Sender<Result<(), PushError>>;

/// Work item for a connection's writer
#[derive(Debug)]
pub enum Outbound {
    /// Serialize and write a frame; `written` is completed after the write
    Frame {
        frame: ServerFrame,
        written: Option<WriteAck>,
    },
    /// Write a close frame and stop
    Close { code: u16, reason: String },
}

/// Sending handle for one user's live connection
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    user_id: Uuid,
    tx: mpsc::UnboundedSender<Outbound>,
    /// Message ids queued while replay runs; `None` once it finished
    replay_window: Arc<Mutex<Option<HashSet<Uuid>>>>,
}

impl Connection {
    /// Create a handle and the queue its writer drains
    pub fn new(user_id: Uuid) -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection = Self {
            id: ConnectionId::generate(),
            user_id,
            tx,
            replay_window: Arc::new(Mutex::new(Some(HashSet::new()))),
        };
        (connection, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The authenticated owner of this connection
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Queue a frame without waiting for it to be written
    ///
    /// # Errors
    ///
    /// `PushError::Closed` if the writer has already stopped.
    pub fn send(&self, frame: impl Into<ServerFrame>) -> Result<(), PushError> {
        self.tx
            .send(Outbound::Frame {
                frame: frame.into(),
                written: None,
            })
            .map_err(|_| PushError::Closed)
    }

    /// Queue a frame and wait until the writer has written it
    ///
    /// Frames queued earlier on this connection are written first.
    ///
    /// # Errors
    ///
    /// `PushError::Closed` if the writer stopped before writing the frame,
    /// `PushError::Write` if the transport rejected it.
    pub async fn push(&self, frame: impl Into<ServerFrame>) -> Result<(), PushError> {
        let (ack, written) = oneshot::channel();
        self.tx
            .send(Outbound::Frame {
                frame: frame.into(),
                written: Some(ack),
            })
            .map_err(|_| PushError::Closed)?;
        written.await.map_err(|_| PushError::Closed)?
    }

    /// Push a message payload, at most once per id until replay finishes
    ///
    /// A message can be listed for replay and routed live at the same time.
    /// Whichever path queues it second gets `Ok(false)` and nothing is
    /// written.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::push`].
    pub async fn push_message(&self, message: ChatMessage) -> Result<bool, PushError> {
        if let Some(id) = message.id {
            let mut window = self.replay_window.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(queued) = window.as_mut() {
                if !queued.insert(id) {
                    return Ok(false);
                }
            }
        }
        self.push(message).await?;
        Ok(true)
    }

    /// Stop tracking pushed message ids
    pub fn finish_replay(&self) {
        *self.replay_window.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Ask the writer to send a close frame and stop
    ///
    /// A no-op if the writer is already gone.
    pub fn close(&self, code: u16, reason: impl Into<String>) {
        let _ = self.tx.send(Outbound::Close {
            code,
            reason: reason.into(),
        });
    }

    /// True once the writer side has been dropped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
