//! WebSocket-Verbindung zum Flurfunk-Relay
//!
//! Ein JSON-Envelope pro Textframe. Ping/Pong erledigt tungstenite.

use futures_util::{SinkExt, StreamExt};
use flurfunk_protocol::{ClientEvent, ServerEvent};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::ChatResult;

/// Client-seitige Verbindung zum Relay
pub struct RelayClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl RelayClient {
    /// Baut die WebSocket-Verbindung auf (z.B. `ws://host:38883/ws`)
    pub async fn verbinden(url: &str) -> ChatResult<Self> {
        tracing::info!(url = %url, "Verbinde mit Relay");
        let (stream, _antwort) = connect_async(url).await?;
        tracing::info!(url = %url, "WebSocket-Verbindung hergestellt");
        Ok(Self { stream })
    }

    /// Sendet ein Client-Event als Textframe
    pub async fn senden(&mut self, event: &ClientEvent) -> ChatResult<()> {
        let json = event.to_json()?;
        tracing::trace!(event = event.name(), bytes = json.len(), "Sende Event");
        self.stream.send(Message::Text(json)).await?;
        Ok(())
    }

    /// Wartet auf das naechste Event vom Relay
    ///
    /// Gibt `Ok(None)` zurueck wenn das Relay die Verbindung geschlossen hat.
    /// Nicht dekodierbare Frames werden protokolliert und uebersprungen.
    pub async fn empfangen(&mut self) -> ChatResult<Option<ServerEvent>> {
        while let Some(frame) = self.stream.next().await {
            match frame? {
                Message::Text(text) => match ServerEvent::decode(&text) {
                    Ok(event) => return Ok(Some(event)),
                    Err(e) => tracing::warn!(fehler = %e, "Ungueltiges Event vom Relay"),
                },
                Message::Close(_) => return Ok(None),
                _ => {}
            }
        }
        Ok(None)
    }

    /// Schliesst die Verbindung sauber
    pub async fn trennen(mut self) -> ChatResult<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}
