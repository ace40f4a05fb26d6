//! WebSocket-Server – axum Router mit `GET /ws`
//!
//! Fuer jede Verbindung wird ein eigener Task mit einer
//! `ClientConnection` gestartet.

use axum::{
    extract::{ws::WebSocketUpgrade, ConnectInfo, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use flurfunk_observability::request_timing_layer;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::connection::ClientConnection;
use crate::server_state::RelayState;

/// Zustand fuer den Upgrade-Handler
#[derive(Clone)]
struct AppState {
    relay: Arc<RelayState>,
    shutdown_rx: watch::Receiver<bool>,
}

/// WebSocket-Relay-Server
pub struct RelayServer {
    state: Arc<RelayState>,
    bind_addr: SocketAddr,
}

impl RelayServer {
    /// Erstellt einen neuen RelayServer
    pub fn neu(state: Arc<RelayState>, bind_addr: SocketAddr) -> Self {
        Self { state, bind_addr }
    }

    /// Baut den axum-Router (`GET /ws`)
    pub fn router(&self, shutdown_rx: watch::Receiver<bool>) -> Router {
        Router::new()
            .route("/ws", get(ws_handler))
            .layer(request_timing_layer())
            .with_state(AppState {
                relay: Arc::clone(&self.state),
                shutdown_rx,
            })
    }

    /// Bindet den Socket und startet den Server
    ///
    /// Laeuft bis `shutdown_rx` ein `true`-Signal empfaengt.
    pub async fn starten(self, shutdown_rx: watch::Receiver<bool>) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        self.mit_listener_starten(listener, shutdown_rx).await
    }

    /// Startet den Server auf einem bereits gebundenen Listener
    pub async fn mit_listener_starten(
        self,
        listener: TcpListener,
        shutdown_rx: watch::Receiver<bool>,
    ) -> std::io::Result<()> {
        let lokale_addr = listener.local_addr()?;
        let app = self.router(shutdown_rx.clone());

        tracing::info!(adresse = %lokale_addr, "WebSocket-Relay gestartet");

        let mut shutdown_rx = shutdown_rx;
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            while shutdown_rx.changed().await.is_ok() {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
            tracing::info!("Relay: Shutdown-Signal empfangen");
        })
        .await?;

        tracing::info!("WebSocket-Relay gestoppt");
        Ok(())
    }
}

/// `GET /ws` – Upgrade auf WebSocket
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app): State<AppState>,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
) -> Response {
    let relay = app.relay;

    // Slot bleibt belegt bis der Verbindungs-Task endet
    let Some(slot) = relay.slot_belegen() else {
        tracing::warn!(
            peer = %peer_addr,
            max = relay.config.max_verbindungen,
            "Relay voll – Verbindung abgelehnt"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "Relay voll").into_response();
    };

    // Frames bis zur doppelten Envelope-Grenze werden gelesen und mit
    // EnvelopeTooLarge beantwortet, darueber bricht der Transport ab.
    let transport_max = relay.config.max_envelope_bytes.saturating_mul(2);
    let shutdown_rx = app.shutdown_rx;

    ws.max_message_size(transport_max)
        .max_frame_size(transport_max)
        .on_upgrade(move |socket| async move {
            ClientConnection::neu(relay, Some(peer_addr))
                .verarbeiten(socket, shutdown_rx)
                .await;
            drop(slot);
        })
}
