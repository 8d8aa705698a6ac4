//! Push-sync wire protocol.
//!
//! JSON text frames over a WebSocket. Clients send `action`-tagged requests;
//! the server answers with `type`-tagged messages and pushes a full `update`
//! to every client whenever the collection changes. The shapes match what the
//! browser client sends, so `requestId` is optional: without it the client
//! only learns about its change through the next `update`.

use serde::{Deserialize, Serialize};

use crate::error::{VcalError, VcalResult};
use crate::event::{Event, EventDraft};
use crate::serde_util::lenient_events;

/// Message from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ClientMessage {
    AddEvent {
        payload: EventDraft,
        #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
    UpdateEvent {
        payload: Event,
        #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
    DeleteEvent {
        payload: DeletePayload,
        #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletePayload {
    pub id: String,
}

impl ClientMessage {
    pub fn request_id(&self) -> Option<&str> {
        match self {
            ClientMessage::AddEvent { request_id, .. }
            | ClientMessage::UpdateEvent { request_id, .. }
            | ClientMessage::DeleteEvent { request_id, .. } => request_id.as_deref(),
        }
    }

    pub fn encode(&self) -> VcalResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Message from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// The full collection. Sent on connect and after every change.
    Update {
        #[serde(deserialize_with = "lenient_events")]
        events: Vec<Event>,
    },

    /// A request succeeded. `event` is the stored record for add/update.
    Ack {
        #[serde(rename = "requestId")]
        request_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        event: Option<Event>,
    },

    /// A request failed, or a frame could not be decoded.
    Error {
        #[serde(rename = "requestId", default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        code: ErrorCode,
        message: String,
    },
}

impl ServerMessage {
    pub fn encode(&self) -> VcalResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn error(request_id: Option<String>, err: &VcalError) -> Self {
        ServerMessage::Error {
            request_id,
            code: ErrorCode::from(err),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    NotFound,
    InvalidEvent,
    BadRequest,
    Internal,
}

impl From<&VcalError> for ErrorCode {
    fn from(err: &VcalError) -> Self {
        match err {
            VcalError::NotFound(_) => ErrorCode::NotFound,
            VcalError::InvalidEvent(_) => ErrorCode::InvalidEvent,
            VcalError::Serialization(_) | VcalError::Protocol(_) => ErrorCode::BadRequest,
            _ => ErrorCode::Internal,
        }
    }
}

impl ErrorCode {
    /// Rebuild a local error from a server reply.
    pub fn into_error(self, message: String) -> VcalError {
        match self {
            ErrorCode::NotFound => VcalError::NotFound(message),
            ErrorCode::InvalidEvent => VcalError::InvalidEvent(message),
            ErrorCode::BadRequest => VcalError::Protocol(message),
            ErrorCode::Internal => VcalError::Remote(message),
        }
    }
}
