/**
 * Chat Wire Types
 *
 * JSON payloads exchanged over the chat WebSocket. All field names are
 * camelCase on the wire.
 *
 * # Client → server
 *
 * ```json
 * { "to": "<recipient uuid>", "message": "hello" }
 * ```
 *
 * Any other field a client sends (`id`, `from`, timestamps) is ignored: the
 * server assigns the id and creation time, and the sender is always the
 * authenticated owner of the connection.
 *
 * # Server → client
 *
 * Either a full message (pushed to recipients and replayed on connect) or a
 * delivery status notice for a message the client sent:
 *
 * ```json
 * { "status": "sent", "id": "<uuid>", "time": "2024-06-01T12:00:00Z" }
 * ```
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;

/// A chat message as it travels over the wire
///
/// Inbound frames only need `to` and `message`; every optional field defaults
/// to `None` when absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Store-assigned id, `None` until persisted
    #[serde(default)]
    pub id: Option<Uuid>,
    /// Sender id
    #[serde(default)]
    pub from: Option<Uuid>,
    /// Recipient id
    pub to: Uuid,
    /// Message body
    pub message: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
    /// Never set by the server at the moment
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// Build an outgoing (client-side) message addressed to `to`
    pub fn outgoing(to: Uuid, message: impl Into<String>) -> Self {
        Self {
            id: None,
            from: None,
            to,
            message: message.into(),
            created_at: None,
            delivered_at: None,
            read_at: None,
        }
    }

    /// Decode an inbound text frame
    ///
    /// # Errors
    ///
    /// Returns `SharedError::Malformed` when the text is not a JSON object with
    /// at least a UUID `to` and a string `message`.
    pub fn from_json(text: &str) -> Result<Self, SharedError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Decode an inbound binary frame holding UTF-8 JSON
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, SharedError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Delivery progress reported back to a sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Persisted by the server
    Sent,
    /// Written to the recipient's live connection
    Delivered,
    /// Persisting or delivering failed
    Error,
}

/// `{status, id, time}` notice sent to the author of a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageStatus {
    pub status: DeliveryStatus,
    /// Message id; `None` when the message was never persisted
    pub id: Option<Uuid>,
    pub time: Option<DateTime<Utc>>,
}

impl MessageStatus {
    pub fn sent(id: Uuid, created_at: DateTime<Utc>) -> Self {
        Self {
            status: DeliveryStatus::Sent,
            id: Some(id),
            time: Some(created_at),
        }
    }

    pub fn delivered(id: Uuid, delivered_at: DateTime<Utc>) -> Self {
        Self {
            status: DeliveryStatus::Delivered,
            id: Some(id),
            time: Some(delivered_at),
        }
    }

    /// Error notice; `id` and `time` are both `None` if nothing was stored
    pub fn error(id: Option<Uuid>, time: Option<DateTime<Utc>>) -> Self {
        Self {
            status: DeliveryStatus::Error,
            id,
            time,
        }
    }
}

/// Anything the server writes to a chat connection
///
/// Serialized untagged, so the JSON is exactly the inner payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ServerFrame {
    Status(MessageStatus),
    Message(ChatMessage),
}

impl ServerFrame {
    /// The message payload, if this frame carries one
    pub fn as_message(&self) -> Option<&ChatMessage> {
        match self {
            Self::Message(message) => Some(message),
            Self::Status(_) => None,
        }
    }

    /// The status notice, if this frame carries one
    pub fn as_status(&self) -> Option<&MessageStatus> {
        match self {
            Self::Status(status) => Some(status),
            Self::Message(_) => None,
        }
    }
}

impl From<MessageStatus> for ServerFrame {
    fn from(status: MessageStatus) -> Self {
        Self::Status(status)
    }
}

impl From<ChatMessage> for ServerFrame {
    fn from(message: ChatMessage) -> Self {
        Self::Message(message)
    }
}
