//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::ConnectionId,
    infrastructure::dto::websocket::ClientMessage,
    ui::{dispatcher::RelayCommand, state::AppState},
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    // 接続 ID はサーバー側で採番する
    let connection_id = ConnectionId::generate();
    tracing::info!("Connection '{}' upgrading to WebSocket", connection_id);
    ws.on_upgrade(move |socket| handle_socket(socket, state, connection_id))
}

/// Spawns a task that receives encoded frames from the rx channel and pushes them to the WebSocket sender.
///
/// This function handles the outbound message flow: every notification addressed to this
/// connection (via rx channel) is written to its WebSocket.
///
/// # Arguments
///
/// * `rx` - Channel receiver registered with the message pusher
/// * `sender` - WebSocket sink to send messages to this client
///
/// # Returns
///
/// A `JoinHandle` for the spawned task
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, connection_id: ConnectionId) {
    let (sender, mut receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();

    // 受信したイベントより先に登録されるよう、最初にディスパッチする
    if !state.dispatcher.dispatch(RelayCommand::Connected {
        connection_id: connection_id.clone(),
        channel: tx,
    }) {
        return;
    }

    let dispatcher = state.dispatcher.clone();
    let from = connection_id.clone();

    // Spawn a task to receive events from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => return format!("transport error: {e}"),
            };

            match msg {
                Message::Text(text) => {
                    let command = match ClientMessage::decode(&text) {
                        Ok(message) => RelayCommand::Message {
                            from: from.clone(),
                            message,
                        },
                        Err(e) => {
                            tracing::warn!("Malformed frame from '{}': {}", from, e);
                            // イベント名が読めた場合は ack の要否をディスパッチャに委ねる
                            let Some(event) = e.event else {
                                continue;
                            };
                            RelayCommand::Malformed {
                                from: from.clone(),
                                event,
                            }
                        }
                    };
                    if !dispatcher.dispatch(command) {
                        return "server shutting down".to_string();
                    }
                }
                Message::Ping(_) => {
                    // Ping/pong is handled automatically by the WebSocket protocol
                    tracing::debug!("Received ping from '{}'", from);
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", from);
                    return "client close".to_string();
                }
                _ => {}
            }
        }
        "transport close".to_string()
    });

    // Spawn a task to write notifications to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    let reason = tokio::select! {
        result = &mut recv_task => {
            send_task.abort();
            result.unwrap_or_else(|e| format!("receive task failed: {e}"))
        }
        _ = &mut send_task => {
            recv_task.abort();
            "send failed".to_string()
        }
    };

    state.dispatcher.dispatch(RelayCommand::Disconnected {
        connection_id,
        reason,
    });
}
