//! Recording clients
//!
//! A [`Connection`]'s writer normally serializes frames onto a WebSocket.
//! `spawn_recorder` drains the queue into a shared log instead and
//! acknowledges each frame, so tests can check what every client saw and in
//! which order across clients.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{stream, Stream};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use uuid::Uuid;

use chatline::backend::realtime::{Connection, ConnectionRegistry, Inbound, Outbound};
use chatline::shared::{ChatMessage, MessageStatus, ServerFrame};

/// What one client's writer did
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Frame(ServerFrame),
    Close(u16),
}

/// `(client name, event)` in write order across all clients
pub type EventLog = Arc<Mutex<Vec<(&'static str, Recorded)>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Drain `outbound` into `log`, acknowledging every frame after recording it
pub fn spawn_recorder(
    name: &'static str,
    mut outbound: UnboundedReceiver<Outbound>,
    log: EventLog,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(item) = outbound.recv().await {
            match item {
                Outbound::Frame { frame, written } => {
                    log.lock().unwrap().push((name, Recorded::Frame(frame)));
                    if let Some(ack) = written {
                        let _ = ack.send(Ok(()));
                    }
                }
                Outbound::Close { code, .. } => {
                    log.lock().unwrap().push((name, Recorded::Close(code)));
                    break;
                }
            }
        }
    })
}

/// A connection for `user_id` whose writes are recorded under `name`
pub fn recorded_connection(name: &'static str, user_id: Uuid, log: &EventLog) -> (Connection, JoinHandle<()>) {
    let (connection, outbound) = Connection::new(user_id);
    let writer = spawn_recorder(name, outbound, log.clone());
    (connection, writer)
}

/// Inbound stream fed by the returned sender; ends when the sender is dropped
pub fn inbound_channel() -> (UnboundedSender<Inbound>, impl Stream<Item = Inbound>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let incoming = stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) });
    (tx, incoming)
}

/// Text frame a client would send to `to`
pub fn text_to(to: Uuid, body: &str) -> Inbound {
    Inbound::Text(serde_json::to_string(&ChatMessage::outgoing(to, body)).unwrap())
}

/// Everything recorded for `name`, in order
pub fn events_for(log: &EventLog, name: &str) -> Vec<Recorded> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|(client, _)| *client == name)
        .map(|(_, event)| event.clone())
        .collect()
}

/// Status notices recorded for `name`
pub fn statuses_for(log: &EventLog, name: &str) -> Vec<MessageStatus> {
    events_for(log, name)
        .into_iter()
        .filter_map(|event| match event {
            Recorded::Frame(ServerFrame::Status(status)) => Some(status),
            _ => None,
        })
        .collect()
}

/// Messages recorded for `name`
pub fn messages_for(log: &EventLog, name: &str) -> Vec<ChatMessage> {
    events_for(log, name)
        .into_iter()
        .filter_map(|event| match event {
            Recorded::Frame(ServerFrame::Message(message)) => Some(message),
            _ => None,
        })
        .collect()
}

/// Position of the first event in the whole log matching `pred`
pub fn position(log: &EventLog, pred: impl Fn(&(&'static str, Recorded)) -> bool) -> Option<usize> {
    log.lock().unwrap().iter().position(pred)
}

/// Wait until `user_id` has a live connection in `registry`
pub async fn wait_registered(registry: &ConnectionRegistry, user_id: Uuid) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while registry.get(user_id).is_none() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("connection was never registered");
}
