//! WebSocket connection handler
//!
//! Each client gets the full event list on connect. Requests are applied to
//! the store in arrival order; the requester gets an `ack` or `error`, and
//! every client gets the new list as an `update`. A requester always sees the
//! `update` for its change before the `ack`.

use axum::{
    Router,
    extract::{
        State,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    },
    response::Response,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use vcal_core::protocol::{ClientMessage, ErrorCode, ServerMessage};
use vcal_core::{Event, EventStore};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(websocket_handler))
}

/// Handle WebSocket upgrade request
async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle established WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let client_id = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();
    info!("Client connected: {}", client_id);

    let (ws_tx, mut ws_rx) = socket.split();

    // Replies from the receive side, written by the send side
    let (tx, rx) = mpsc::unbounded_channel::<ServerMessage>();

    // Mark the current snapshot as seen before reading, so no change in
    // between is missed.
    let mut snapshots = state.store.subscribe();
    snapshots.borrow_and_update();

    let initial = match state.store.list_events().await {
        Ok(events) => events,
        Err(e) => {
            error!("Could not read events for {}: {}", client_id, e);
            return;
        }
    };
    let _ = tx.send(ServerMessage::Update { events: initial });

    let send_task = send_loop(ws_tx, rx, snapshots, &client_id);

    let recv_task = async {
        while let Some(msg) = ws_rx.next().await {
            match msg {
                Ok(WsMessage::Text(text)) => {
                    if let Some(reply) = handle_client_message(text.as_str(), &state).await
                        && tx.send(reply).is_err()
                    {
                        break;
                    }
                }
                Ok(WsMessage::Close(_)) => {
                    debug!("Client closed connection: {}", client_id);
                    break;
                }
                Err(e) => {
                    warn!("WebSocket error from {}: {}", client_id, e);
                    break;
                }
                _ => {}
            }
        }
    };

    // Run both tasks
    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    info!("Client disconnected: {}", client_id);
}

/// The only writer to the socket: replies in order, plus an `update` after
/// every store change.
async fn send_loop(
    mut ws_tx: futures::stream::SplitSink<WebSocket, WsMessage>,
    mut replies: mpsc::UnboundedReceiver<ServerMessage>,
    mut snapshots: watch::Receiver<Vec<Event>>,
    client_id: &str,
) {
    loop {
        let outgoing = tokio::select! {
            reply = replies.recv() => match reply {
                Some(ServerMessage::Ack { request_id, event }) => {
                    // The change behind this ack is already published; flush
                    // it first so the requester's view is current on ack.
                    if snapshots.has_changed().unwrap_or(false) {
                        let events = snapshots.borrow_and_update().clone();
                        if send(&mut ws_tx, &ServerMessage::Update { events }).await.is_err() {
                            break;
                        }
                    }
                    ServerMessage::Ack { request_id, event }
                }
                Some(message) => message,
                None => break,
            },
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let events = snapshots.borrow_and_update().clone();
                ServerMessage::Update { events }
            }
        };

        if send(&mut ws_tx, &outgoing).await.is_err() {
            break;
        }
    }
    debug!("Send task ended for client: {}", client_id);
}

async fn send(
    ws_tx: &mut futures::stream::SplitSink<WebSocket, WsMessage>,
    message: &ServerMessage,
) -> Result<(), ()> {
    let text = match message.encode() {
        Ok(text) => text,
        Err(e) => {
            error!("Could not encode message: {}", e);
            return Ok(());
        }
    };
    ws_tx.send(WsMessage::Text(text.into())).await.map_err(|_| ())
}

/// Handle incoming client message
async fn handle_client_message(text: &str, state: &AppState) -> Option<ServerMessage> {
    apply_request(text, state.store.as_ref()).await
}

/// Apply one request to `store`. Returns the reply for the requester, if any.
async fn apply_request<S: EventStore + ?Sized>(
    text: &str,
    store: &S,
) -> Option<ServerMessage> {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            warn!("Rejecting malformed message: {}", e);
            return Some(ServerMessage::Error {
                request_id: raw_request_id(text),
                code: ErrorCode::BadRequest,
                message: format!("Invalid message: {}", e),
            });
        }
    };

    debug!("Received message: {:?}", message);
    let request_id = message.request_id().map(str::to_string);

    let result = match message {
        ClientMessage::AddEvent { payload, .. } => store.create_event(payload).await.map(Some),
        ClientMessage::UpdateEvent { payload, .. } => store.update_event(payload).await.map(Some),
        ClientMessage::DeleteEvent { payload, .. } => {
            store.delete_event(&payload.id).await.map(|_| None)
        }
    };

    match (result, request_id) {
        (Ok(event), Some(request_id)) => Some(ServerMessage::Ack { request_id, event }),
        (Ok(_), None) => None,
        (Err(e), request_id) => {
            warn!("Request failed: {}", e);
            Some(ServerMessage::error(request_id, &e))
        }
    }
}

/// Best-effort `requestId` from a frame that did not decode as a request.
fn raw_request_id(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    value.get("requestId")?.as_str().map(str::to_string)
}
