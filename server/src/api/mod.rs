use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use flume::{Receiver, Sender, TrySendError};
use serde_json::{json, Value};
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::summary::Snapshot;

mod push;

type ClientSender = Sender<String>;

pub struct AppState {
    symbols: Vec<String>,
    latest: RwLock<Arc<Snapshot>>,
    clients: Mutex<Vec<ClientSender>>,
}

impl AppState {
    pub fn new(symbols: Vec<String>) -> Self {
        Self {
            symbols,
            latest: RwLock::new(Arc::new(Snapshot::default())),
            clients: Mutex::new(vec![]),
        }
    }

    pub async fn latest(&self) -> Arc<Snapshot> {
        self.latest.read().await.clone()
    }

    /// Swaps in the snapshot of a completed cycle; readers keep whatever Arc they already hold.
    pub async fn replace(&self, snapshot: Snapshot) {
        *self.latest.write().await = Arc::new(snapshot);
    }

    pub async fn subscribe(&self, client: ClientSender) -> usize {
        let mut clients = self.clients.lock().await;
        clients.push(client);
        clients.len()
    }

    /// Fire-and-forget: a client whose queue is full misses this payload,
    /// a disconnected one is dropped from the list.
    pub async fn broadcast(&self, payload: &str) {
        let mut clients = self.clients.lock().await;
        let before = clients.len();

        clients.retain(|client| match client.try_send(payload.to_string()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::debug!("Client is lagging behind, skipping snapshot");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });

        if clients.len() < before {
            tracing::info!(
                "{} clients disconnected. Clients left: {}",
                before - clients.len(),
                clients.len()
            );
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/data", get(get_data))
        .route("/api/crypto", get(get_crypto))
        .route("/api/banner-1h", get(get_banner_1h))
        .route("/api/health", get(get_health))
        .route("/ws", get(push::ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn get_data(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    Json(state.latest().await.as_ref().clone())
}

async fn get_crypto(State(state): State<Arc<AppState>>) -> Json<Value> {
    let snapshot = state.latest().await;
    Json(json!({
        "gainers": snapshot.gainers,
        "losers": snapshot.losers,
        "top24h": snapshot.top24h,
    }))
}

async fn get_banner_1h(State(state): State<Arc<AppState>>) -> Json<Value> {
    let snapshot = state.latest().await;
    Json(json!({ "banner": snapshot.banner_1h }))
}

async fn get_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let snapshot = state.latest().await;
    Json(json!({
        "status": "ok",
        "symbols": state.symbols,
        "last_update": snapshot.updated_at,
    }))
}

/// Publishes every snapshot: stored for HTTP readers, then pushed to subscribers.
pub fn spawn_broadcaster(
    state: Arc<AppState>,
    snapshot_rx: Receiver<Snapshot>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Ok(snapshot) = snapshot_rx.recv_async().await {
            let payload = serde_json::to_string(&snapshot);
            state.replace(snapshot).await;

            match payload {
                Ok(payload) => state.broadcast(&payload).await,
                Err(error) => tracing::error!("Can't serialize snapshot: {}", error),
            }
        }

        tracing::info!("Snapshot channel is closed. Broadcaster finished");
    })
}

pub async fn serve(
    snapshot_rx: Receiver<Snapshot>,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState::new(config.symbols.clone()));

    let _broadcaster = spawn_broadcaster(state.clone(), snapshot_rx);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received, stopping..."),
        Err(error) => {
            tracing::error!("Can't listen for shutdown signal: {}", error);
            std::future::pending::<()>().await;
        }
    }
}
