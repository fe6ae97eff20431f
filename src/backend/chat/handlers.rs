//! Chat REST handlers
//!
//! Read and delete access to the caller's chats. Messages themselves are sent
//! over the WebSocket endpoint; these handlers only list what is stored.
//!
//! All handlers work against whatever `MessageStore` the application runs
//! with, so they are available with or without a database.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::backend::chat::store::{Chat, Page};
use crate::backend::error::BackendError;
use crate::backend::middleware::auth::AuthUser;
use crate::backend::realtime::DeliveryCoordinator;
use crate::shared::ChatMessage;

/// `GET /api/chats` - the caller's chats, most recently active first
pub async fn list_chats(
    AuthUser(user): AuthUser,
    State(coordinator): State<DeliveryCoordinator>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<Chat>>, BackendError> {
    let chats = coordinator.store().list_chats(user.user_id, page).await?;
    Ok(Json(chats))
}

/// `GET /api/chats/{id}`
pub async fn get_chat(
    AuthUser(user): AuthUser,
    State(coordinator): State<DeliveryCoordinator>,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<Chat>, BackendError> {
    coordinator
        .store()
        .find_chat(chat_id, user.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| BackendError::NotFound("Chat".to_string()))
}

/// `DELETE /api/chats/{id}` - removes the chat and its messages for both participants
pub async fn delete_chat(
    AuthUser(user): AuthUser,
    State(coordinator): State<DeliveryCoordinator>,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<Chat>, BackendError> {
    let chat = coordinator
        .store()
        .delete_chat(chat_id, user.user_id)
        .await?
        .ok_or_else(|| BackendError::NotFound("Chat".to_string()))?;
    tracing::info!(%chat_id, user_id = %user.user_id, "Chat deleted");
    Ok(Json(chat))
}

/// `GET /api/chats/{id}/messages` - newest first
pub async fn list_chat_messages(
    AuthUser(user): AuthUser,
    State(coordinator): State<DeliveryCoordinator>,
    Path(chat_id): Path<Uuid>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<ChatMessage>>, BackendError> {
    let store = coordinator.store();
    if store.find_chat(chat_id, user.user_id).await?.is_none() {
        return Err(BackendError::NotFound("Chat".to_string()));
    }
    let messages = store
        .list_chat_messages(chat_id, user.user_id, page)
        .await?
        .iter()
        .map(|message| message.to_wire())
        .collect();
    Ok(Json(messages))
}
