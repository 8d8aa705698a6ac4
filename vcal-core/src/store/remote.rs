//! Event store backed by the push-sync server.
//!
//! A single background task owns the WebSocket. It forwards queued requests,
//! routes `ack`/`error` replies back to the waiting caller by request id, and
//! publishes every `update` snapshot. When the connection drops it reconnects
//! following the [`ReconnectPolicy`]; the task stops when the store is dropped.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use super::{EventStore, ReconnectPolicy};
use crate::error::{VcalError, VcalResult};
use crate::event::{Event, EventDraft};
use crate::protocol::{ClientMessage, DeletePayload, ServerMessage};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

type Reply = VcalResult<Option<Event>>;
type PendingReplies = Arc<Mutex<HashMap<String, oneshot::Sender<Reply>>>>;
type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone)]
pub struct RemoteStoreOptions {
    /// How long a request waits for its reply (and `list_events` for the
    /// first snapshot).
    pub request_timeout: Duration,
    pub reconnect: ReconnectPolicy,
}

impl Default for RemoteStoreOptions {
    fn default() -> Self {
        RemoteStoreOptions {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// Events held by a sync server, reached over a WebSocket.
pub struct RemoteStore {
    url: String,
    outgoing: mpsc::UnboundedSender<ClientMessage>,
    pending: PendingReplies,
    snapshots: watch::Receiver<Vec<Event>>,
    request_timeout: Duration,
    connection: JoinHandle<()>,
}

impl RemoteStore {
    /// Start the connection task. Returns immediately; the first connection
    /// attempt happens in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(url: impl Into<String>, options: RemoteStoreOptions) -> Self {
        let url = url.into();
        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshots) = watch::channel(Vec::new());
        let pending: PendingReplies = Arc::new(Mutex::new(HashMap::new()));

        let connection = tokio::spawn(supervise(
            url.clone(),
            options.reconnect,
            outgoing_rx,
            pending.clone(),
            snapshot_tx,
        ));

        RemoteStore {
            url,
            outgoing,
            pending,
            snapshots,
            request_timeout: options.request_timeout,
            connection,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send a request and wait for the server's reply to it.
    async fn request(
        &self,
        build: impl FnOnce(Option<String>) -> ClientMessage + Send,
    ) -> Reply {
        let request_id = uuid::Uuid::new_v4().to_string();
        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending.lock().await.insert(request_id.clone(), reply_tx);

        if self.outgoing.send(build(Some(request_id.clone()))).is_err() {
            self.pending.lock().await.remove(&request_id);
            return Err(VcalError::Connection("sync connection task has stopped".into()));
        }

        match timeout(self.request_timeout, reply_rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => Err(VcalError::Connection(
                "connection closed before the server replied".into(),
            )),
            Err(_) => {
                // Drop the entry so a late reply (or a still-queued send) is discarded.
                self.pending.lock().await.remove(&request_id);
                Err(VcalError::Timeout(self.request_timeout.as_secs()))
            }
        }
    }
}

impl Drop for RemoteStore {
    fn drop(&mut self) {
        self.connection.abort();
    }
}

#[async_trait]
impl EventStore for RemoteStore {
    async fn list_events(&self) -> VcalResult<Vec<Event>> {
        let mut snapshots = self.snapshots.clone();

        let received_any = snapshots
            .has_changed()
            .map_err(|_| VcalError::Connection("sync connection task has stopped".into()))?;

        if !received_any {
            timeout(self.request_timeout, snapshots.changed())
                .await
                .map_err(|_| VcalError::Timeout(self.request_timeout.as_secs()))?
                .map_err(|_| VcalError::Connection("sync connection task has stopped".into()))?;
        }

        let events = snapshots.borrow_and_update().clone();
        Ok(events)
    }

    async fn create_event(&self, draft: EventDraft) -> VcalResult<Event> {
        draft.validate()?;

        self.request(|request_id| ClientMessage::AddEvent {
            payload: draft,
            request_id,
        })
        .await?
        .ok_or_else(|| VcalError::Protocol("server acknowledged addEvent without an event".into()))
    }

    async fn update_event(&self, event: Event) -> VcalResult<Event> {
        event.validate()?;
        let id = event.id.clone();

        let reply = self
            .request(|request_id| ClientMessage::UpdateEvent {
                payload: event.clone(),
                request_id,
            })
            .await;

        match reply {
            Ok(stored) => Ok(stored.unwrap_or(event)),
            Err(VcalError::NotFound(_)) => Err(VcalError::NotFound(id)),
            Err(e) => Err(e),
        }
    }

    async fn delete_event(&self, id: &str) -> VcalResult<()> {
        let payload = DeletePayload { id: id.to_string() };
        self.request(|request_id| ClientMessage::DeleteEvent { payload, request_id })
            .await?;
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Vec<Event>> {
        self.snapshots.clone()
    }
}

// =============================================================================
// Connection task
// =============================================================================

enum SessionEnd {
    /// The store was dropped; stop for good.
    StoreDropped,
    Disconnected(String),
}

async fn supervise(
    url: String,
    policy: ReconnectPolicy,
    mut outgoing: mpsc::UnboundedReceiver<ClientMessage>,
    pending: PendingReplies,
    snapshots: watch::Sender<Vec<Event>>,
) {
    let mut failures: u32 = 0;

    loop {
        match connect_async(url.as_str()).await {
            Ok((socket, _)) => {
                info!("Connected to sync server at {}", url);
                failures = 0;

                match run_session(socket, &mut outgoing, &pending, &snapshots).await {
                    SessionEnd::StoreDropped => return,
                    SessionEnd::Disconnected(reason) => {
                        warn!("Sync connection lost: {}", reason);
                    }
                }
                fail_pending(&pending).await;
            }
            Err(e) => {
                warn!("Could not connect to sync server at {}: {}", url, e);
            }
        }

        failures = failures.saturating_add(1);
        let delay = policy.delay_for(failures);
        info!("Reconnecting in {:.1}s", delay.as_secs_f64());
        tokio::time::sleep(delay).await;
    }
}

async fn run_session(
    socket: Socket,
    outgoing: &mut mpsc::UnboundedReceiver<ClientMessage>,
    pending: &PendingReplies,
    snapshots: &watch::Sender<Vec<Event>>,
) -> SessionEnd {
    let (mut write, mut read) = socket.split();

    loop {
        tokio::select! {
            queued = outgoing.recv() => {
                let Some(message) = queued else {
                    let _ = write.close().await;
                    return SessionEnd::StoreDropped;
                };

                // Skip requests whose caller already gave up.
                if let Some(request_id) = message.request_id()
                    && !pending.lock().await.contains_key(request_id)
                {
                    debug!("Dropping abandoned request {}", request_id);
                    continue;
                }

                let text = match message.encode() {
                    Ok(text) => text,
                    Err(e) => {
                        resolve(pending, message.request_id(), Err(e)).await;
                        continue;
                    }
                };

                if let Err(e) = write.send(WsMessage::Text(text.into())).await {
                    return SessionEnd::Disconnected(e.to_string());
                }
            }
            incoming = read.next() => {
                match incoming {
                    Some(Ok(WsMessage::Text(text))) => {
                        handle_server_message(text.as_str(), pending, snapshots).await;
                    }
                    Some(Ok(WsMessage::Close(_))) | None => {
                        return SessionEnd::Disconnected("closed by server".into());
                    }
                    Some(Err(e)) => return SessionEnd::Disconnected(e.to_string()),
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

async fn handle_server_message(
    text: &str,
    pending: &PendingReplies,
    snapshots: &watch::Sender<Vec<Event>>,
) {
    let message = match serde_json::from_str::<ServerMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            warn!("Ignoring undecodable message from sync server: {}", e);
            return;
        }
    };

    match message {
        ServerMessage::Update { events } => {
            debug!("Received snapshot with {} events", events.len());
            snapshots.send_replace(events);
        }
        ServerMessage::Ack { request_id, event } => {
            resolve(pending, Some(&request_id), Ok(event)).await;
        }
        ServerMessage::Error { request_id: Some(request_id), code, message } => {
            resolve(pending, Some(&request_id), Err(code.into_error(message))).await;
        }
        ServerMessage::Error { request_id: None, message, .. } => {
            warn!("Sync server reported: {}", message);
        }
    }
}

async fn resolve(pending: &PendingReplies, request_id: Option<&str>, reply: Reply) {
    let Some(request_id) = request_id else {
        return;
    };

    match pending.lock().await.remove(request_id) {
        Some(waiter) => {
            let _ = waiter.send(reply);
        }
        None => debug!("No caller waiting for reply {}", request_id),
    }
}

/// Fail everything in flight; those requests may or may not have been applied.
async fn fail_pending(pending: &PendingReplies) {
    for (_, waiter) in pending.lock().await.drain() {
        let _ = waiter.send(Err(VcalError::Connection(
            "connection lost before the server replied".into(),
        )));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn options() -> RemoteStoreOptions {
        RemoteStoreOptions {
            request_timeout: Duration::from_millis(200),
            reconnect: ReconnectPolicy::new(Duration::from_millis(50), Duration::from_millis(100)),
        }
    }

    #[tokio::test]
    async fn list_times_out_without_server() {
        // Port 9 (discard) is not expected to accept WebSocket upgrades.
        let store = RemoteStore::connect("ws://127.0.0.1:9/ws", options());

        let err = store.list_events().await.unwrap_err();
        assert!(matches!(err, VcalError::Timeout(_)));
    }

    #[tokio::test]
    async fn requests_fail_without_server() {
        let store = RemoteStore::connect("ws://127.0.0.1:9/ws", options());
        let draft = EventDraft::new("Offline", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        let err = store.create_event(draft).await.unwrap_err();
        assert!(matches!(err, VcalError::Timeout(_) | VcalError::Connection(_)));
    }

    #[tokio::test]
    async fn invalid_drafts_never_reach_the_wire() {
        let store = RemoteStore::connect("ws://127.0.0.1:9/ws", options());
        let draft = EventDraft::new("", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        let err = store.create_event(draft).await.unwrap_err();
        assert!(matches!(err, VcalError::InvalidEvent(_)));
    }

    #[tokio::test]
    async fn replies_route_by_request_id() {
        let pending: PendingReplies = Arc::new(Mutex::new(HashMap::new()));
        let (snapshot_tx, _snapshot_rx) = watch::channel(Vec::new());
        let (tx, rx) = oneshot::channel();
        pending.lock().await.insert("r1".into(), tx);

        handle_server_message(
            r#"{"type":"error","requestId":"r1","code":"notFound","message":"e9"}"#,
            &pending,
            &snapshot_tx,
        )
        .await;

        let reply = rx.await.unwrap();
        assert!(matches!(reply, Err(VcalError::NotFound(_))));
        assert!(pending.lock().await.is_empty());
    }

    #[tokio::test]
    async fn updates_publish_snapshots() {
        let pending: PendingReplies = Arc::new(Mutex::new(HashMap::new()));
        let (snapshot_tx, mut snapshot_rx) = watch::channel(Vec::new());

        handle_server_message(
            r#"{"type":"update","events":[{"id":"a","title":"A","startDate":"2024-01-01","endDate":"2024-01-01"}]}"#,
            &pending,
            &snapshot_tx,
        )
        .await;

        assert!(snapshot_rx.has_changed().unwrap());
        assert_eq!(snapshot_rx.borrow_and_update()[0].id, "a");
    }
}
