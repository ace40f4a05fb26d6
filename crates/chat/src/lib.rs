//! flurfunk-chat – Client-seitige Chat-Logik
//!
//! Dieses Crate implementiert die Gegenseite zum Relay:
//! - ChatSession: verschluesselt vor dem Senden, entschluesselt nach dem Empfang
//! - FileAttachment: Datei-Anhaenge mit Groessenlimit und Fingerprint
//! - Verlaufsexport als Textdatei
//! - RelayClient: WebSocket-Verbindung zum Relay
//!
//! # Beispiel
//!
//! ```no_run
//! use flurfunk_chat::{ChatSession, RelayClient};
//! use flurfunk_crypto::RoomCredentials;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), flurfunk_chat::ChatError> {
//!     let mut session = ChatSession::neu(RoomCredentials::generieren());
//!     let mut client = RelayClient::verbinden("ws://127.0.0.1:38883/ws").await?;
//!
//!     client.senden(&session.join_event()).await?;
//!     client.senden(&session.text_event("Hallo!")?).await?;
//!
//!     while let Some(event) = client.empfangen().await? {
//!         let eintrag = session.receive(event);
//!         println!("{}", eintrag.zeile());
//!     }
//!     Ok(())
//! }
//! ```

pub mod attachment;
pub mod client;
pub mod error;
pub mod session;
pub mod size;
pub mod transcript;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use attachment::{FileAttachment, MAX_DATEI_BYTES};
pub use client::RelayClient;
pub use error::{ChatError, ChatResult};
pub use session::{ChatEntry, ChatSession, Inhalt, PLATZHALTER_UNLESBAR};
pub use size::human_size;
pub use transcript::{export_dateiname, exportieren, transcript};
