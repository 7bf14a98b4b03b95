//! WebSocket handler for live ranking updates.
//!
//! Handles WebSocket connections, dispatches client requests to the banner
//! handlers and sends the current snapshot on connect. Later snapshots and
//! events arrive through the relay.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::sort::BannerSortEngine;
use crate::websocket::{ClientMessage, ConnectionManager, ServerMessage};

use super::{handle_demote, handle_flush, handle_promote, handle_reorder, ReorderRequest};

/// Handle an established WebSocket connection.
///
/// This function:
/// 1. Registers the connection with the manager
/// 2. Sends the current snapshot
/// 3. Spawns a task to forward outgoing messages
/// 4. Processes incoming messages in a loop
/// 5. Cleans up on disconnect
pub async fn handle_websocket_connection(
    socket: WebSocket,
    engine: Arc<BannerSortEngine>,
    conn_manager: Arc<ConnectionManager>,
) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let conn_id = conn_manager.register(tx);
    conn_manager.send_to(&conn_id, ServerMessage::snapshot(engine.snapshot()));

    tracing::info!(conn_id = %conn_id, "WebSocket client connected");

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(text) => {
                    if let Err(e) = ws_sender.send(Message::Text(text.into())).await {
                        tracing::warn!("Failed to send WebSocket message: {}", e);
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to serialize WebSocket message: {}", e);
                }
            }
        }
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let response = process_message(&text, &engine).await;
                conn_manager.send_to(&conn_id, response);
            }
            Ok(Message::Binary(_)) => {
                tracing::warn!("Binary messages not supported");
            }
            Ok(Message::Ping(data)) => {
                tracing::trace!("Received ping: {} bytes", data.len());
            }
            Ok(Message::Pong(_)) => {
                tracing::trace!("Received pong");
            }
            Ok(Message::Close(_)) => {
                tracing::info!(conn_id = %conn_id, "WebSocket close frame received");
                break;
            }
            Err(e) => {
                tracing::warn!(conn_id = %conn_id, "WebSocket error: {}", e);
                break;
            }
        }
    }

    conn_manager.unregister(&conn_id);
    send_task.abort();

    tracing::info!(
        conn_id = %conn_id,
        active_connections = conn_manager.connection_count(),
        "WebSocket client disconnected"
    );
}

/// Process a client message and return a server response.
pub(crate) async fn process_message(text: &str, engine: &BannerSortEngine) -> ServerMessage {
    let client_msg: ClientMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            return ServerMessage::error(format!("Invalid message format: {}", e), 400, None);
        }
    };

    match client_msg {
        ClientMessage::ProposeReorder { order, request_id } => {
            respond(handle_reorder(engine, ReorderRequest { order }), request_id)
        }
        ClientMessage::FlushReorder { request_id } => respond(handle_flush(engine), request_id),
        ClientMessage::Promote { id, request_id } => match handle_promote(engine, &id).await {
            Ok(item) => ServerMessage::Ack {
                item: Some(item),
                request_id,
            },
            Err(e) => error_message(e, request_id),
        },
        ClientMessage::Demote { id, request_id } => {
            respond(handle_demote(engine, &id).await, request_id)
        }
        ClientMessage::Ping => ServerMessage::Pong,
    }
}

/// Acknowledge success; the new state reaches the client through the relay.
fn respond<T>(result: crate::error::Result<T>, request_id: Option<String>) -> ServerMessage {
    match result {
        Ok(_) => ServerMessage::ack(request_id),
        Err(e) => error_message(e, request_id),
    }
}

fn error_message(error: AppError, request_id: Option<String>) -> ServerMessage {
    tracing::debug!(error = %error, "WebSocket request failed");
    ServerMessage::error(error.to_string(), error.status().as_u16(), request_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryBannerStore;
    use crate::sort::EngineConfig;
    use banner_engine::{Item, ManualScheduler};

    fn engine() -> Arc<BannerSortEngine> {
        let items = vec![
            Item::active("a", 1, 0),
            Item::active("b", 2, 0),
            Item::active("c", 3, 0),
            Item::parked("d", 0),
        ];
        BannerSortEngine::new(
            Arc::new(MemoryBannerStore::new(items.clone())),
            Arc::new(ManualScheduler::new()),
            EngineConfig::default(),
            items,
        )
    }

    #[tokio::test]
    async fn test_ping() {
        let engine = engine();
        let response = process_message(r#"{"type":"ping"}"#, &engine).await;
        assert!(matches!(response, ServerMessage::Pong));
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let engine = engine();
        let response = process_message("not json", &engine).await;
        assert!(matches!(response, ServerMessage::Error { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_propose_is_acknowledged() {
        let engine = engine();
        let text = r#"{"type":"propose_reorder","order":["c","a","b"],"request_id":"r1"}"#;

        let response = process_message(text, &engine).await;
        assert!(matches!(
            response,
            ServerMessage::Ack { request_id: Some(ref id), .. } if id == "r1"
        ));
        assert_eq!(engine.snapshot().ranked_ids(), vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_promote_over_capacity_maps_to_422() {
        let engine = engine();
        let text = r#"{"type":"promote","id":"d","request_id":"r2"}"#;

        let response = process_message(text, &engine).await;
        match response {
            ServerMessage::Error {
                status, request_id, ..
            } => {
                assert_eq!(status, 422);
                assert_eq!(request_id.as_deref(), Some("r2"));
            }
            other => panic!("Expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_conflict_maps_to_409() {
        let engine = engine();
        process_message(r#"{"type":"propose_reorder","order":["b","a","c"]}"#, &engine).await;

        let response = process_message(r#"{"type":"demote","id":"a"}"#, &engine).await;
        assert!(matches!(response, ServerMessage::Error { status: 409, .. }));
    }
}
