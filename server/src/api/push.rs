use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};

use super::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Sends the current snapshot right away, then every new one until the client goes away.
/// Anything the client sends besides a close is ignored.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let (tx, rx) = flume::bounded::<String>(1);
    let clients = state.subscribe(tx).await;
    tracing::info!("New client connected. Total of {} clients connected", clients);

    match serde_json::to_string(state.latest().await.as_ref()) {
        Ok(current) => {
            if sender.send(Message::Text(current.into())).await.is_err() {
                return;
            }
        }
        Err(error) => tracing::error!("Can't serialize snapshot: {}", error),
    }

    loop {
        tokio::select! {
            payload = rx.recv_async() => {
                let Ok(payload) = payload else { break };
                if sender.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    // dropping `rx` marks this client disconnected; the next broadcast prunes it
    tracing::debug!("Client socket closed");
}
