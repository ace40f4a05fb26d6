//! Client-Connection – Verwaltet eine einzelne WebSocket-Verbindung
//!
//! Jede Verbindung laeuft in einem eigenen tokio-Task. Die Schleife
//! wartet gleichzeitig auf eingehende Frames, auf ausgehende Events aus
//! der Send-Queue und auf das Shutdown-Signal.
//!
//! Fehlerhafte Envelopes werden mit einem `error`-Event beantwortet, die
//! Verbindung bleibt offen. Beim Verbindungsende wird die Verbindung aus
//! allen Raeumen entfernt.

use axum::extract::ws::{Message, WebSocket};
use flurfunk_core::ConnectionId;
use flurfunk_protocol::{decode_begrenzt, EnvelopeError};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::dispatcher::{DispatcherContext, MessageDispatcher};
use crate::error::RelayError;
use crate::server_state::RelayState;

/// Verarbeitet eine einzelne WebSocket-Verbindung
pub struct ClientConnection {
    state: Arc<RelayState>,
    peer_addr: Option<SocketAddr>,
}

impl ClientConnection {
    /// Erstellt eine neue ClientConnection
    pub fn neu(state: Arc<RelayState>, peer_addr: Option<SocketAddr>) -> Self {
        Self { state, peer_addr }
    }

    /// Startet die Verbindungs-Verarbeitungsschleife
    ///
    /// Laeuft bis der Client trennt, ein Transportfehler auftritt oder
    /// ein Shutdown-Signal eingeht.
    pub async fn verarbeiten(
        self,
        socket: WebSocket,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) {
        let conn_id = ConnectionId::new();
        let max_bytes = self.state.config.max_envelope_bytes;

        let mut sende_rx = self.state.broadcaster.client_registrieren(conn_id);
        self.state.gauges_aktualisieren();

        let dispatcher = MessageDispatcher::neu(Arc::clone(&self.state));
        let mut ctx = DispatcherContext::neu(conn_id, self.peer_addr);
        let (mut ws_tx, mut ws_rx) = socket.split();

        tracing::info!(conn = %conn_id, peer = ?self.peer_addr, "Neue Verbindung");

        loop {
            tokio::select! {
                // Eingehender Frame vom Client
                frame = ws_rx.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            let ergebnis = decode_begrenzt(&text, max_bytes)
                                .map_err(RelayError::from)
                                .and_then(|event| {
                                    tracing::trace!(
                                        conn = %conn_id,
                                        event = event.name(),
                                        bytes = text.len(),
                                        "Event empfangen"
                                    );
                                    dispatcher.dispatch(event, &mut ctx)
                                });
                            if let Err(e) = ergebnis {
                                dispatcher.fehler_melden(&ctx, &e);
                            }
                        }
                        Some(Ok(Message::Binary(daten))) => {
                            let fehler = if daten.len() > max_bytes {
                                EnvelopeError::TooLarge {
                                    size: daten.len(),
                                    max: max_bytes,
                                }
                            } else {
                                EnvelopeError::Malformed(
                                    "Binaerframes werden nicht unterstuetzt".into(),
                                )
                            };
                            dispatcher.fehler_melden(&ctx, &RelayError::from(fehler));
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            tracing::info!(conn = %conn_id, "Verbindung vom Client getrennt");
                            break;
                        }
                        // Ping/Pong erledigt der Transport
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!(conn = %conn_id, fehler = %e, "WebSocket-Lesefehler");
                            break;
                        }
                    }
                }

                // Ausgehendes Event aus der Send-Queue
                Some(ausgehend) = sende_rx.recv() => {
                    if let Err(e) = ws_tx.send(Message::Text(ausgehend.to_string())).await {
                        tracing::warn!(conn = %conn_id, fehler = %e, "Senden fehlgeschlagen");
                        break;
                    }
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(
                            conn = %conn_id,
                            "Shutdown-Signal – Verbindung wird getrennt"
                        );
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }

        // Cleanup beim Verbindungsende
        dispatcher.handle_disconnect(&mut ctx);
        tracing::info!(conn = %conn_id, "Verbindungs-Task beendet");
    }
}
