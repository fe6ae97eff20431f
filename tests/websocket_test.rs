//! End-to-end WebSocket tests against a live listener

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, Message},
    MaybeTlsStream, WebSocketStream,
};
use uuid::Uuid;

use chatline::backend::routes::create_router;
use chatline::backend::server::AppState;
use chatline::shared::{ChatMessage, DeliveryStatus, ServerFrame};
use common::*;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn serve(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Connect as `user_id` and wait until the server has registered the socket
async fn connect(addr: SocketAddr, state: &AppState, user_id: Uuid) -> Client {
    let token = user_token(state, user_id);
    let (client, _response) = connect_async(format!("ws://{addr}/api/chats/ws?token={token}"))
        .await
        .expect("WebSocket handshake failed");
    client
}

async fn send(client: &mut Client, message: &ChatMessage) {
    let text = serde_json::to_string(message).unwrap();
    client.send(Message::Text(text.into())).await.unwrap();
}

/// Next raw message, skipping pings and pongs
async fn next_message(client: &mut Client) -> Message {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match client.next().await {
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                Some(Ok(message)) => return message,
                other => panic!("connection ended: {other:?}"),
            }
        }
    })
    .await
    .expect("timed out waiting for a frame")
}

async fn next_frame(client: &mut Client) -> ServerFrame {
    match next_message(client).await {
        Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

#[tokio::test]
async fn test_message_between_connected_users() {
    let state = test_state();
    let addr = serve(state.clone()).await;
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

    let mut bob_client = connect(addr, &state, bob).await;
    wait_registered(state.realtime.registry(), bob).await;
    let mut alice_client = connect(addr, &state, alice).await;
    wait_registered(state.realtime.registry(), alice).await;

    send(&mut alice_client, &ChatMessage::outgoing(bob, "hello over the wire")).await;

    let sent = next_frame(&mut alice_client).await;
    let sent = sent.as_status().expect("status notice");
    assert_eq!(sent.status, DeliveryStatus::Sent);

    let pushed = next_frame(&mut bob_client).await;
    let pushed = pushed.as_message().expect("message payload");
    assert_eq!(pushed.message, "hello over the wire");
    assert_eq!(pushed.from, Some(alice));
    assert_eq!(pushed.id, sent.id);
    assert!(pushed.delivered_at.is_some());

    let delivered = next_frame(&mut alice_client).await;
    let delivered = delivered.as_status().expect("status notice");
    assert_eq!(delivered.status, DeliveryStatus::Delivered);
    assert_eq!(delivered.id, sent.id);
    assert_eq!(delivered.time, pushed.delivered_at);
}

#[tokio::test]
async fn test_offline_messages_are_replayed_on_connect() {
    let state = test_state();
    let addr = serve(state.clone()).await;
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

    let mut alice_client = connect(addr, &state, alice).await;
    wait_registered(state.realtime.registry(), alice).await;
    send(&mut alice_client, &ChatMessage::outgoing(bob, "while you were away")).await;
    let sent = next_frame(&mut alice_client).await;
    assert_eq!(sent.as_status().map(|s| s.status), Some(DeliveryStatus::Sent));

    let mut bob_client = connect(addr, &state, bob).await;
    let replayed = next_frame(&mut bob_client).await;
    let replayed = replayed.as_message().expect("message payload");
    assert_eq!(replayed.message, "while you were away");
    assert_eq!(replayed.from, Some(alice));
    assert_eq!(replayed.id, sent.as_status().and_then(|s| s.id));
}

#[tokio::test]
async fn test_second_connection_closes_the_first() {
    let state = test_state();
    let addr = serve(state.clone()).await;
    let bob = Uuid::new_v4();

    let mut first = connect(addr, &state, bob).await;
    wait_registered(state.realtime.registry(), bob).await;
    let first_id = state.realtime.registry().get(bob).map(|c| c.id());

    let _second = connect(addr, &state, bob).await;

    match next_message(&mut first).await {
        Message::Close(Some(frame)) => assert_eq!(u16::from(frame.code), 4000),
        other => panic!("expected close frame, got {other:?}"),
    }

    tokio::time::timeout(Duration::from_secs(5), async {
        while state.realtime.registry().get(bob).map(|c| c.id()) == first_id {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("newer connection was never registered");
    assert!(state.realtime.registry().get(bob).is_some());
}

#[tokio::test]
async fn test_malformed_frame_closes_socket() {
    let state = test_state();
    let addr = serve(state.clone()).await;
    let alice = Uuid::new_v4();

    let mut client = connect(addr, &state, alice).await;
    client.send(Message::Text(r#"{"hello": true}"#.to_string().into())).await.unwrap();

    match next_message(&mut client).await {
        Message::Close(Some(frame)) => assert_eq!(u16::from(frame.code), 1003),
        other => panic!("expected close frame, got {other:?}"),
    }
}

#[tokio::test]
async fn test_handshake_without_token_is_rejected() {
    let state = test_state();
    let addr = serve(state).await;

    match connect_async(format!("ws://{addr}/api/chats/ws")).await {
        Err(tungstenite::Error::Http(response)) => assert_eq!(response.status().as_u16(), 401),
        Err(e) => panic!("expected HTTP 401, got {e:?}"),
        Ok(_) => panic!("handshake without a token must fail"),
    }
}
