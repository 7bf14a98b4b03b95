//! WebSocket message protocol definitions.
//!
//! All messages are JSON-encoded, tagged by `type`, and use snake_case for
//! field names. Snapshots keep the camelCase shape of the HTTP API.

use banner_engine::{EngineSnapshot, Item};
use serde::{Deserialize, Serialize};

use crate::sort::EngineEvent;

/// Messages sent from client to server.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Replace the pending order of the current drag gesture.
    ProposeReorder {
        /// Active banner ids, first is rank 1
        order: Vec<String>,
        /// Request ID for correlating responses
        #[serde(default)]
        request_id: Option<String>,
    },

    /// Commit the pending order now (drag ended).
    FlushReorder {
        #[serde(default)]
        request_id: Option<String>,
    },

    /// Activate a parked banner at the end of the ranking.
    Promote {
        id: String,
        #[serde(default)]
        request_id: Option<String>,
    },

    /// Park an active banner.
    Demote {
        id: String,
        #[serde(default)]
        request_id: Option<String>,
    },

    /// Keep-alive ping.
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Current ranking, sent on connect and after every change.
    Snapshot { snapshot: EngineSnapshot },

    /// Something the engine did (commit, rollback, reset).
    Event { event: EngineEvent },

    /// A request was accepted.
    Ack {
        /// Banner returned by the store, for promote
        #[serde(skip_serializing_if = "Option::is_none")]
        item: Option<Item>,
        /// Request ID from the original request
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },

    /// Response to ping.
    Pong,

    /// Error message.
    Error {
        /// Error description
        message: String,
        /// HTTP-equivalent status code
        status: u16,
        /// Request ID from the original request (if applicable)
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
}

impl ServerMessage {
    /// Create a snapshot push.
    pub fn snapshot(snapshot: EngineSnapshot) -> Self {
        ServerMessage::Snapshot { snapshot }
    }

    /// Create an event push.
    pub fn event(event: EngineEvent) -> Self {
        ServerMessage::Event { event }
    }

    /// Create an acknowledgement.
    pub fn ack(request_id: Option<String>) -> Self {
        ServerMessage::Ack {
            item: None,
            request_id,
        }
    }

    /// Create an error message.
    pub fn error(message: impl Into<String>, status: u16, request_id: Option<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
            status,
            request_id,
        }
    }
}
