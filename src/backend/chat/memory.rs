//! In-memory message store
//!
//! Used when the server runs without `DATABASE_URL` and throughout the tests.
//! All state sits behind one mutex, so every operation is atomic with respect
//! to the others. Nothing survives a restart.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::store::{
    participants, Chat, MessageStore, NewMessage, Page, SavedMessage, StorageError, StoredMessage,
};

#[derive(Debug, Default)]
struct Inner {
    chats: Vec<Chat>,
    /// Kept in insertion order, which is creation order
    messages: Vec<StoredMessage>,
}

/// Mutex-guarded `MessageStore`
#[derive(Debug, Default)]
pub struct MemoryMessageStore {
    inner: Mutex<Inner>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored messages
    pub fn message_count(&self) -> usize {
        self.lock().messages.len()
    }

    /// Look up a single message by id
    pub fn message(&self, id: Uuid) -> Option<StoredMessage> {
        self.lock().messages.iter().find(|m| m.id == id).cloned()
    }
}

/// Page through an already ordered iterator
fn paginate<T>(items: impl Iterator<Item = T>, page: Page) -> Vec<T> {
    items
        .skip(usize::try_from(page.offset()).unwrap_or(0))
        .take(page.limit() as usize)
        .collect()
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn save(&self, message: &NewMessage) -> Result<SavedMessage, StorageError> {
        let pair = participants(message.from, message.to);
        let now = Utc::now();
        let mut inner = self.lock();

        let chat_id = match inner.chats.iter_mut().find(|chat| chat.users == pair) {
            Some(chat) => {
                chat.updated_at = now;
                chat.id
            }
            None => {
                let chat = Chat {
                    id: Uuid::new_v4(),
                    users: pair.to_vec(),
                    created_at: now,
                    updated_at: now,
                };
                let id = chat.id;
                inner.chats.push(chat);
                id
            }
        };

        let stored = StoredMessage {
            id: Uuid::new_v4(),
            chat_id,
            sender_id: message.from,
            recipient_id: message.to,
            body: message.body.clone(),
            created_at: now,
            delivered_at: None,
            read_at: None,
        };
        let saved = SavedMessage {
            id: stored.id,
            chat_id,
            created_at: stored.created_at,
        };
        inner.messages.push(stored);
        Ok(saved)
    }

    async fn mark_delivered(&self, id: Uuid) -> Result<DateTime<Utc>, StorageError> {
        let mut inner = self.lock();
        let message = inner
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(StorageError::NotFound(id))?;
        // The wall clock may step backwards; never report delivery before creation.
        let now = Utc::now().max(message.created_at);
        Ok(*message.delivered_at.get_or_insert(now))
    }

    async fn list_undelivered(&self, user_id: Uuid) -> Result<Vec<StoredMessage>, StorageError> {
        Ok(self
            .lock()
            .messages
            .iter()
            .filter(|m| m.recipient_id == user_id && m.delivered_at.is_none())
            .cloned()
            .collect())
    }

    async fn list_chats(&self, user_id: Uuid, page: Page) -> Result<Vec<Chat>, StorageError> {
        let inner = self.lock();
        let mut chats: Vec<&Chat> = inner
            .chats
            .iter()
            .filter(|chat| chat.has_participant(user_id))
            .collect();
        chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(paginate(chats.into_iter().cloned(), page))
    }

    async fn find_chat(&self, chat_id: Uuid, user_id: Uuid) -> Result<Option<Chat>, StorageError> {
        Ok(self
            .lock()
            .chats
            .iter()
            .find(|chat| chat.id == chat_id && chat.has_participant(user_id))
            .cloned())
    }

    async fn delete_chat(&self, chat_id: Uuid, user_id: Uuid) -> Result<Option<Chat>, StorageError> {
        let mut inner = self.lock();
        let Some(index) = inner
            .chats
            .iter()
            .position(|chat| chat.id == chat_id && chat.has_participant(user_id))
        else {
            return Ok(None);
        };
        let chat = inner.chats.remove(index);
        inner.messages.retain(|m| m.chat_id != chat_id);
        Ok(Some(chat))
    }

    async fn list_chat_messages(
        &self,
        chat_id: Uuid,
        user_id: Uuid,
        page: Page,
    ) -> Result<Vec<StoredMessage>, StorageError> {
        let inner = self.lock();
        let member = inner
            .chats
            .iter()
            .any(|chat| chat.id == chat_id && chat.has_participant(user_id));
        if !member {
            return Ok(Vec::new());
        }
        let newest_first = inner
            .messages
            .iter()
            .rev()
            .filter(|m| m.chat_id == chat_id)
            .cloned();
        Ok(paginate(newest_first, page))
    }
}
