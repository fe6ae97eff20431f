//! Delivery coordinator.
//!
//! Takes one inbound message from a connected sender and walks it through:
//!
//! ```text
//! persist ──err──► {status:"error", id:null}                    Failed
//!    │
//!    ▼
//! {status:"sent"} ──recipient offline──►                        Acknowledged
//!    │
//!    ▼
//! mark delivered ──err──► {status:"error", id}                  Failed
//!    │
//!    ▼
//! push to recipient, wait for write ──err──► {status:"error"}   Failed
//!    │
//!    ▼
//! {status:"delivered"}                                          Delivered
//! ```
//!
//! Offline recipients get their messages through [`DeliveryCoordinator::replay_undelivered`]
//! when they next connect.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::connection::Connection;
use super::registry::ConnectionRegistry;
use crate::backend::chat::store::{MessageStore, NewMessage};
use crate::shared::{ChatMessage, MessageStatus, ServerFrame};

/// Where a failed delivery stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailure {
    /// The store refused the message; nothing was persisted
    Persist,
    /// Persisted, but recording delivery failed; left for replay
    MarkDelivered,
    /// Persisted and marked, but the recipient's connection was gone
    RecipientClosed,
}

/// Terminal state of one inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Persisted, recipient offline
    Acknowledged(Uuid),
    /// Persisted and written to the recipient's connection
    Delivered(Uuid),
    Failed(DeliveryFailure),
}

/// Routes messages between live connections through the message store
#[derive(Clone)]
pub struct DeliveryCoordinator {
    registry: Arc<ConnectionRegistry>,
    store: Arc<dyn MessageStore>,
}

impl DeliveryCoordinator {
    pub fn new(registry: Arc<ConnectionRegistry>, store: Arc<dyn MessageStore>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn MessageStore> {
        &self.store
    }

    /// Persist `inbound` and route it to its recipient
    ///
    /// The sender is always the owner of `sender`; `inbound.from` is ignored.
    /// When the recipient is connected this returns only after the payload has
    /// been written to the recipient and the "delivered" notice queued for the
    /// sender.
    pub async fn deliver(&self, sender: &Connection, inbound: ChatMessage) -> DeliveryOutcome {
        let from = sender.user_id();
        let new_message = NewMessage {
            from,
            to: inbound.to,
            body: inbound.message,
        };

        let saved = match self.store.save(&new_message).await {
            Ok(saved) => saved,
            Err(e) => {
                warn!(%from, to = %new_message.to, error = %e, "Failed to persist message");
                notify(sender, MessageStatus::error(None, None));
                return DeliveryOutcome::Failed(DeliveryFailure::Persist);
            }
        };
        notify(sender, MessageStatus::sent(saved.id, saved.created_at));

        let Some(recipient) = self.registry.get(new_message.to) else {
            debug!(message_id = %saved.id, to = %new_message.to, "Recipient offline, message kept for replay");
            return DeliveryOutcome::Acknowledged(saved.id);
        };

        // Marked before the push: if the push fails the message stays marked
        // delivered and is not replayed.
        let delivered_at = match self.store.mark_delivered(saved.id).await {
            Ok(delivered_at) => delivered_at,
            Err(e) => {
                warn!(message_id = %saved.id, error = %e, "Failed to mark message delivered");
                notify(sender, MessageStatus::error(Some(saved.id), Some(Utc::now())));
                return DeliveryOutcome::Failed(DeliveryFailure::MarkDelivered);
            }
        };

        let payload = ChatMessage {
            id: Some(saved.id),
            from: Some(from),
            to: new_message.to,
            message: new_message.body,
            created_at: Some(saved.created_at),
            delivered_at: Some(delivered_at),
            read_at: None,
        };
        match recipient.push_message(payload).await {
            Ok(true) => {}
            Ok(false) => debug!(message_id = %saved.id, "Recipient already got the message from replay"),
            Err(e) => {
                warn!(
                    message_id = %saved.id,
                    recipient = %recipient.id(),
                    error = %e,
                    "Failed to push message to recipient"
                );
                notify(sender, MessageStatus::error(Some(saved.id), Some(Utc::now())));
                return DeliveryOutcome::Failed(DeliveryFailure::RecipientClosed);
            }
        }

        notify(sender, MessageStatus::delivered(saved.id, delivered_at));
        DeliveryOutcome::Delivered(saved.id)
    }

    /// Push every undelivered message addressed to the connection's owner
    ///
    /// Messages go out one per frame in creation order; each is marked
    /// delivered after its write completes. Messages already pushed live to
    /// this connection are skipped. Stops at the first failed write, leaving
    /// the rest for the next connection. Returns how many were written.
    pub async fn replay_undelivered(&self, connection: &Connection) -> usize {
        let replayed = self.replay_pending(connection).await;
        connection.finish_replay();
        if replayed > 0 {
            info!(user_id = %connection.user_id(), count = replayed, "Replayed undelivered messages");
        }
        replayed
    }

    async fn replay_pending(&self, connection: &Connection) -> usize {
        let user_id = connection.user_id();
        let pending = match self.store.list_undelivered(user_id).await {
            Ok(pending) => pending,
            Err(e) => {
                warn!(%user_id, error = %e, "Failed to load undelivered messages");
                return 0;
            }
        };

        let mut replayed = 0;
        for message in pending {
            match connection.push_message(message.to_wire()).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(%user_id, message_id = %message.id, "Already delivered live, skipping");
                    continue;
                }
                Err(e) => {
                    debug!(%user_id, message_id = %message.id, error = %e, "Replay interrupted");
                    break;
                }
            }
            replayed += 1;
            if let Err(e) = self.store.mark_delivered(message.id).await {
                warn!(message_id = %message.id, error = %e, "Failed to mark replayed message delivered");
            }
        }
        replayed
    }
}

/// Queue a status notice for the sender; a closed sender is only logged
fn notify(sender: &Connection, status: MessageStatus) {
    if sender.send(ServerFrame::Status(status)).is_err() {
        debug!(connection = %sender.id(), "Sender connection closed before status notice");
    }
}
