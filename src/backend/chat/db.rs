/**
 * PostgreSQL Message Store
 *
 * `MessageStore` backed by the `chats` and `messages` tables (see
 * `migrations/`). The chat upsert and the message insert run as one statement,
 * so a message row never exists without its chat.
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::store::{
    participants, Chat, MessageStore, NewMessage, Page, SavedMessage, StorageError, StoredMessage,
};

/// `MessageStore` over a sqlx connection pool
#[derive(Debug, Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn save(&self, message: &NewMessage) -> Result<SavedMessage, StorageError> {
        let users = participants(message.from, message.to).to_vec();

        let saved = sqlx::query_as::<_, SavedMessage>(
            r#"
            WITH chat AS (
                INSERT INTO chats (users)
                VALUES ($1)
                ON CONFLICT (users) DO UPDATE SET updated_at = NOW()
                RETURNING id
            )
            INSERT INTO messages (chat_id, sender_id, recipient_id, body)
            SELECT chat.id, $2, $3, $4 FROM chat
            RETURNING id, chat_id, created_at
            "#,
        )
        .bind(users)
        .bind(message.from)
        .bind(message.to)
        .bind(&message.body)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }

    async fn mark_delivered(&self, id: Uuid) -> Result<DateTime<Utc>, StorageError> {
        let delivered_at: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            UPDATE messages
            SET delivered_at = COALESCE(delivered_at, GREATEST(NOW(), created_at))
            WHERE id = $1
            RETURNING delivered_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        delivered_at.ok_or(StorageError::NotFound(id))
    }

    async fn list_undelivered(&self, user_id: Uuid) -> Result<Vec<StoredMessage>, StorageError> {
        let messages = sqlx::query_as::<_, StoredMessage>(
            r#"
            SELECT id, chat_id, sender_id, recipient_id, body, created_at, delivered_at, read_at
            FROM messages
            WHERE recipient_id = $1 AND delivered_at IS NULL
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn list_chats(&self, user_id: Uuid, page: Page) -> Result<Vec<Chat>, StorageError> {
        let chats = sqlx::query_as::<_, Chat>(
            r#"
            SELECT id, users, created_at, updated_at
            FROM chats
            WHERE $1 = ANY(users)
            ORDER BY updated_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(chats)
    }

    async fn find_chat(&self, chat_id: Uuid, user_id: Uuid) -> Result<Option<Chat>, StorageError> {
        let chat = sqlx::query_as::<_, Chat>(
            r#"
            SELECT id, users, created_at, updated_at
            FROM chats
            WHERE id = $1 AND $2 = ANY(users)
            "#,
        )
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(chat)
    }

    async fn delete_chat(&self, chat_id: Uuid, user_id: Uuid) -> Result<Option<Chat>, StorageError> {
        // Messages go with the chat through ON DELETE CASCADE
        let chat = sqlx::query_as::<_, Chat>(
            r#"
            DELETE FROM chats
            WHERE id = $1 AND $2 = ANY(users)
            RETURNING id, users, created_at, updated_at
            "#,
        )
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(chat)
    }

    async fn list_chat_messages(
        &self,
        chat_id: Uuid,
        user_id: Uuid,
        page: Page,
    ) -> Result<Vec<StoredMessage>, StorageError> {
        let messages = sqlx::query_as::<_, StoredMessage>(
            r#"
            SELECT m.id, m.chat_id, m.sender_id, m.recipient_id, m.body,
                   m.created_at, m.delivered_at, m.read_at
            FROM messages m
            JOIN chats c ON c.id = m.chat_id
            WHERE m.chat_id = $1 AND $2 = ANY(c.users)
            ORDER BY m.created_at DESC, m.id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(chat_id)
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }
}
