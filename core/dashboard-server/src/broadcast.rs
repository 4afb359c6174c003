//! Live-update fan-out to connected WebSocket clients.
//!
//! Each client gets an unbounded channel; a per-connection write task drains
//! it into the socket. A broadcast re-reads both state documents once,
//! serializes one snapshot, and pushes the same string to every client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use dashboard_core::{StateDocument, StateStore};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::context::SharedContext;
use crate::watcher::ChangeEvent;

pub type ClientId = u64;

pub struct Broadcaster {
    store: StateStore,
    clients: Mutex<HashMap<ClientId, UnboundedSender<String>>>,
    next_id: AtomicU64,
}

impl Broadcaster {
    pub fn new(store: StateStore) -> Self {
        Self {
            store,
            clients: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn clients(&self) -> MutexGuard<'_, HashMap<ClientId, UnboundedSender<String>>> {
        self.clients.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn register(&self) -> (ClientId, UnboundedReceiver<String>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.clients().insert(id, tx);
        debug!(client = id, "Live client registered");
        (id, rx)
    }

    pub fn unregister(&self, id: ClientId) {
        if self.clients().remove(&id).is_some() {
            debug!(client = id, "Live client unregistered");
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients().len()
    }

    /// Serialized snapshot of both documents, or `None` if either is unreadable.
    fn snapshot_message(&self) -> Option<String> {
        let snapshot = match self.store.snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "Skipping broadcast, state documents unreadable");
                return None;
            }
        };
        match serde_json::to_string(&snapshot) {
            Ok(message) => Some(message),
            Err(err) => {
                warn!(error = %err, "Failed to serialize snapshot");
                None
            }
        }
    }

    /// Pushes a fresh snapshot to every live client. Returns how many clients
    /// received it; clients whose channel has closed are dropped.
    pub fn notify_all(&self) -> usize {
        let Some(message) = self.snapshot_message() else {
            return 0;
        };

        let mut clients = self.clients();
        let mut closed = Vec::new();
        for (id, tx) in clients.iter() {
            if tx.send(message.clone()).is_err() {
                closed.push(*id);
            }
        }
        for id in &closed {
            clients.remove(id);
        }
        let delivered = clients.len();
        debug!(delivered, dropped = closed.len(), "Snapshot broadcast");
        delivered
    }

    /// Sends the current snapshot to one freshly connected client.
    pub fn send_initial(&self, id: ClientId) -> bool {
        let Some(message) = self.snapshot_message() else {
            return false;
        };
        match self.clients().get(&id) {
            Some(tx) => tx.send(message).is_ok(),
            None => false,
        }
    }
}

/// Consumes watcher events until the sender side is dropped.
pub async fn run_change_loop(broadcaster: Arc<Broadcaster>, mut events: UnboundedReceiver<ChangeEvent>) {
    while let Some(event) = events.recv().await {
        match event.document {
            StateDocument::Registry => info!("Registry changed"),
            StateDocument::TokenUsage => info!("Tokens changed"),
        }
        broadcaster.notify_all();
    }
    debug!("Change loop stopped");
}

// ═══════════════════════════════════════════════════════════════════════════════
// WebSocket endpoint
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn ws_route(ws: WebSocketUpgrade, State(ctx): State<SharedContext>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_live_client(socket, ctx))
}

async fn handle_live_client(socket: WebSocket, ctx: SharedContext) {
    let (mut sender, mut receiver) = socket.split();
    let broadcaster = Arc::clone(&ctx.broadcaster);
    let (id, mut out_rx) = broadcaster.register();
    info!(client = id, clients = broadcaster.client_count(), "Client connected");
    broadcaster.send_initial(id);

    let write_task = tokio::spawn(async move {
        while let Some(message) = out_rx.recv().await {
            if sender.send(Message::Text(message)).await.is_err() {
                break;
            }
        }
    });

    // Push-only channel: incoming frames are drained until the client closes.
    while let Some(incoming) = receiver.next().await {
        match incoming {
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        }
    }

    broadcaster.unregister(id);
    write_task.abort();
    info!(client = id, "Client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_core::StorageConfig;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn broadcaster(temp: &TempDir) -> Broadcaster {
        Broadcaster::new(StateStore::new(StorageConfig::with_home(temp.path().to_path_buf())))
    }

    fn parse(message: &str) -> Value {
        serde_json::from_str(message).unwrap()
    }

    #[test]
    fn test_each_client_gets_one_snapshot_per_broadcast() {
        let temp = TempDir::new().unwrap();
        let broadcaster = broadcaster(&temp);
        let (_a, mut rx_a) = broadcaster.register();
        let (_b, mut rx_b) = broadcaster.register();

        assert_eq!(broadcaster.notify_all(), 2);

        let expected = json!({"type": "update", "projects": [], "tokens": {}});
        assert_eq!(parse(&rx_a.try_recv().unwrap()), expected);
        assert_eq!(parse(&rx_b.try_recv().unwrap()), expected);
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn test_snapshot_reflects_saved_documents() {
        let temp = TempDir::new().unwrap();
        let broadcaster = broadcaster(&temp);
        broadcaster
            .store
            .save(StateDocument::TokenUsage, &json!({"today": 42}))
            .unwrap();
        let (id, mut rx) = broadcaster.register();

        assert!(broadcaster.send_initial(id));

        let message = parse(&rx.try_recv().unwrap());
        assert_eq!(message["tokens"], json!({"today": 42}));
    }

    #[test]
    fn test_closed_clients_are_dropped() {
        let temp = TempDir::new().unwrap();
        let broadcaster = broadcaster(&temp);
        let (_a, rx_a) = broadcaster.register();
        let (_b, _rx_b) = broadcaster.register();
        drop(rx_a);

        assert_eq!(broadcaster.notify_all(), 1);
        assert_eq!(broadcaster.client_count(), 1);
    }

    #[test]
    fn test_malformed_document_skips_broadcast() {
        let temp = TempDir::new().unwrap();
        let broadcaster = broadcaster(&temp);
        let path = broadcaster.store.path(StateDocument::Registry);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{broken").unwrap();
        let (id, mut rx) = broadcaster.register();

        assert_eq!(broadcaster.notify_all(), 0);
        assert!(!broadcaster.send_initial(id));
        assert!(rx.try_recv().is_err());
        assert_eq!(broadcaster.client_count(), 1);
    }

    #[test]
    fn test_unregister_removes_client() {
        let temp = TempDir::new().unwrap();
        let broadcaster = broadcaster(&temp);
        let (id, _rx) = broadcaster.register();

        broadcaster.unregister(id);

        assert_eq!(broadcaster.client_count(), 0);
        assert_eq!(broadcaster.notify_all(), 0);
    }

    #[tokio::test]
    async fn test_change_loop_broadcasts_each_event() {
        let temp = TempDir::new().unwrap();
        let broadcaster = Arc::new(broadcaster(&temp));
        let (_id, mut rx) = broadcaster.register();
        let (tx, events) = mpsc::unbounded_channel();

        tx.send(ChangeEvent { document: StateDocument::Registry }).unwrap();
        tx.send(ChangeEvent { document: StateDocument::TokenUsage }).unwrap();
        drop(tx);
        run_change_loop(Arc::clone(&broadcaster), events).await;

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }
}
