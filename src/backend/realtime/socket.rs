//! WebSocket endpoint.
//!
//! Upgrades `GET /api/chats/ws` for an authenticated user and bridges the
//! socket to [`run_session`]: the read half becomes the session's inbound
//! stream, the write half is drained from the connection's outbound queue by a
//! dedicated writer task.

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::connection::{Connection, Outbound, PushError};
use super::coordinator::DeliveryCoordinator;
use super::session::{run_session, Inbound};
use crate::backend::middleware::auth::AuthUser;

/// WebSocket upgrade handler.
///
/// Unauthenticated requests are rejected with 401 by the `AuthUser` extractor
/// before any upgrade happens.
pub async fn chat_socket(
    AuthUser(user): AuthUser,
    State(coordinator): State<DeliveryCoordinator>,
    ws: WebSocketUpgrade,
) -> Response {
    let user_id = user.user_id;
    ws.on_failed_upgrade(move |e| error!(%user_id, error = %e, "WebSocket upgrade failed"))
        .on_upgrade(move |socket| handle_socket(socket, user_id, coordinator))
}

/// Handles one upgraded socket until either side gives up.
async fn handle_socket(socket: WebSocket, user_id: Uuid, coordinator: DeliveryCoordinator) {
    let (connection, outbound) = Connection::new(user_id);
    let conn_id = connection.id();
    let (sink, stream) = socket.split();

    let mut writer = tokio::spawn(write_outbound(sink, outbound));

    let incoming = stream.filter_map(|result| async move {
        match result {
            Ok(Message::Text(text)) => Some(Inbound::Text(text.to_string())),
            Ok(Message::Binary(bytes)) => Some(Inbound::Binary(bytes.to_vec())),
            Ok(Message::Close(_)) => Some(Inbound::Close),
            // axum answers pings itself
            Ok(Message::Ping(_) | Message::Pong(_)) => None,
            Err(e) => Some(Inbound::Error(e.to_string())),
        }
    });

    let session_finished = tokio::select! {
        end = run_session(&coordinator, connection, incoming) => {
            debug!(%conn_id, ?end, "Session finished, flushing writer");
            true
        }
        _ = &mut writer => false,
    };

    if session_finished {
        // All handles are gone once the session is deregistered, so the
        // writer drains what is left and stops.
        let _ = writer.await;
    } else {
        info!(%conn_id, "Writer stopped, dropping session");
        coordinator.registry().remove_connection(user_id, conn_id);
    }
}

/// Drain the outbound queue into the socket.
///
/// Each frame's acknowledgement is completed after its write. Stops after a
/// close frame, on the first failed write, or when every handle is dropped.
async fn write_outbound(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: UnboundedReceiver<Outbound>,
) {
    while let Some(item) = outbound.recv().await {
        match item {
            Outbound::Frame { frame, written } => {
                // A frame that fails to serialize is skipped; a failed write ends the socket.
                let (result, transport_failed) = match serde_json::to_string(&frame) {
                    Ok(json) => match sink.send(Message::Text(json.into())).await {
                        Ok(()) => (Ok(()), false),
                        Err(e) => (Err(PushError::Write(e.to_string())), true),
                    },
                    Err(e) => {
                        error!(error = %e, "Failed to serialize outbound frame");
                        (Err(PushError::Write(e.to_string())), false)
                    }
                };
                if let Some(ack) = written {
                    let _ = ack.send(result);
                }
                if transport_failed {
                    break;
                }
            }
            Outbound::Close { code, reason } => {
                let frame = CloseFrame {
                    code,
                    reason: reason.into(),
                };
                let _ = sink.send(Message::Close(Some(frame))).await;
                break;
            }
        }
    }
}
