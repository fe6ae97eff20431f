/**
 * Message Store
 *
 * Persistence seam for chat messages. The delivery coordinator and the chat
 * REST handlers only talk to `dyn MessageStore`; `PgMessageStore` backs it with
 * PostgreSQL and `MemoryMessageStore` keeps everything in process when no
 * database is configured.
 *
 * # Chats
 *
 * Every message belongs to the chat of its two participants. A chat is keyed
 * by the sorted participant pair (see [`participants`]), so A → B and B → A
 * land in the same chat. Saving a message creates the chat on first use and
 * bumps its `updated_at` otherwise.
 *
 * # Delivery time
 *
 * `delivered_at` is written once. Marking an already delivered message again
 * returns the stored timestamp unchanged.
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::shared::ChatMessage;

/// Default page size for chat and message listings
pub const DEFAULT_PAGE_SIZE: i64 = 30;

/// Upper bound for a client-requested page size
pub const MAX_PAGE_SIZE: i64 = 100;

/// Highest page index honoured; larger requests read this page
pub const MAX_PAGE: i64 = 100_000;

/// Errors raised by message stores
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying database rejected or failed the operation
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No message with this id exists
    #[error("message {0} not found")]
    NotFound(Uuid),

    /// The store cannot serve requests right now
    #[error("message store unavailable: {0}")]
    Unavailable(String),
}

/// A message accepted from a sender, not yet persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub from: Uuid,
    pub to: Uuid,
    pub body: String,
}

/// What the store reports back after persisting a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct SavedMessage {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A persisted message row
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StoredMessage {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
}

impl StoredMessage {
    /// Convert to the wire representation
    pub fn to_wire(&self) -> ChatMessage {
        ChatMessage {
            id: Some(self.id),
            from: Some(self.sender_id),
            to: self.recipient_id,
            message: self.body.clone(),
            created_at: Some(self.created_at),
            delivered_at: self.delivered_at,
            read_at: self.read_at,
        }
    }
}

/// A two-party conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: Uuid,
    /// Sorted participant pair
    pub users: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.users.contains(&user_id)
    }
}

/// Sorted participant pair identifying the chat between `a` and `b`
pub fn participants(a: Uuid, b: Uuid) -> [Uuid; 2] {
    if a <= b {
        [a, b]
    } else {
        [b, a]
    }
}

/// Page selection for listings (`?page=&per_page=`)
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Page {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Page {
    /// Rows to return
    pub fn limit(&self) -> i64 {
        self.per_page
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Rows to skip, `per_page * page`
    pub fn offset(&self) -> i64 {
        self.limit()
            .saturating_mul(self.page.unwrap_or(0).clamp(0, MAX_PAGE))
    }
}

/// Persistence for chat messages and chats
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a message, creating or touching its chat
    async fn save(&self, message: &NewMessage) -> Result<SavedMessage, StorageError>;

    /// Record delivery time; first write wins
    ///
    /// # Errors
    ///
    /// `StorageError::NotFound` if the id is unknown.
    async fn mark_delivered(&self, id: Uuid) -> Result<DateTime<Utc>, StorageError>;

    /// Messages addressed to `user_id` that were never delivered, oldest first
    async fn list_undelivered(&self, user_id: Uuid) -> Result<Vec<StoredMessage>, StorageError>;

    /// Chats `user_id` participates in, most recently active first
    async fn list_chats(&self, user_id: Uuid, page: Page) -> Result<Vec<Chat>, StorageError>;

    /// One chat, only if `user_id` participates in it
    async fn find_chat(&self, chat_id: Uuid, user_id: Uuid) -> Result<Option<Chat>, StorageError>;

    /// Delete a chat and its messages, only if `user_id` participates in it
    async fn delete_chat(&self, chat_id: Uuid, user_id: Uuid) -> Result<Option<Chat>, StorageError>;

    /// Messages of a chat, newest first
    ///
    /// Returns an empty list when the chat is unknown or `user_id` is not a
    /// participant.
    async fn list_chat_messages(
        &self,
        chat_id: Uuid,
        user_id: Uuid,
        page: Page,
    ) -> Result<Vec<StoredMessage>, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participants_sorted_regardless_of_direction() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(participants(a, b), participants(b, a));
        let [low, high] = participants(a, b);
        assert!(low <= high);
        assert_eq!(participants(a, a), [a, a]);
    }

    #[test]
    fn test_page_defaults_and_bounds() {
        let page = Page::default();
        assert_eq!(page.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(page.offset(), 0);

        let page = Page { page: Some(2), per_page: Some(10) };
        assert_eq!(page.offset(), 20);

        let page = Page { page: Some(-3), per_page: Some(10_000) };
        assert_eq!(page.limit(), MAX_PAGE_SIZE);
        assert_eq!(page.offset(), 0);

        let page = Page { page: Some(i64::MAX), per_page: Some(i64::MAX) };
        assert_eq!(page.limit(), MAX_PAGE_SIZE);
        assert_eq!(page.offset(), MAX_PAGE_SIZE * MAX_PAGE);
    }

    #[test]
    fn test_stored_message_to_wire() {
        let stored = StoredMessage {
            id: Uuid::new_v4(),
            chat_id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            recipient_id: Uuid::new_v4(),
            body: "hello".into(),
            created_at: Utc::now(),
            delivered_at: None,
            read_at: None,
        };
        let wire = stored.to_wire();
        assert_eq!(wire.id, Some(stored.id));
        assert_eq!(wire.from, Some(stored.sender_id));
        assert_eq!(wire.to, stored.recipient_id);
        assert_eq!(wire.message, "hello");
        assert_eq!(wire.delivered_at, None);
    }
}
