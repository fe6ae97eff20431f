/**
 * Chat Routes
 *
 * - `GET /api/chats/ws` - WebSocket upgrade for live messaging
 * - `GET /api/chats` - The caller's chats
 * - `GET /api/chats/{id}` / `DELETE /api/chats/{id}`
 * - `GET /api/chats/{id}/messages` - Chat history, newest first
 *
 * Every route requires authentication; unauthenticated requests get 401,
 * including the WebSocket endpoint, which rejects before upgrading.
 */

use axum::{routing::get, Router};

use crate::backend::chat::handlers::{delete_chat, get_chat, list_chat_messages, list_chats};
use crate::backend::realtime::chat_socket;
use crate::backend::server::state::AppState;

/// Add the chat routes to `router`
pub fn configure_chat_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/chats/ws", get(chat_socket))
        .route("/api/chats", get(list_chats))
        .route("/api/chats/{id}", get(get_chat).delete(delete_chat))
        .route("/api/chats/{id}/messages", get(list_chat_messages))
}
