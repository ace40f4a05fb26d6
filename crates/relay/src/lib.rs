//! flurfunk-relay – Raum-basiertes WebSocket-Relay
//!
//! Das Relay verwaltet Raum-Mitgliedschaften und leitet opake,
//! client-seitig verschluesselte Payloads an die anderen Mitglieder
//! eines Raums weiter. Klartext sieht es nie.
//!
//! ## Architektur
//!
//! ```text
//! axum Router (RelayServer, GET /ws)
//!     |
//!     v
//! ClientConnection (pro WebSocket ein Task)
//!     |  State Machine: Connected -> InRoom(room) -> Connected -> Disconnected
//!     |
//!     v
//! MessageDispatcher
//!     +-- join   (Registry.join, Hinweis an andere Mitglieder)
//!     +-- send   (Mitgliedschaft pruefen, an andere Mitglieder weiterleiten)
//!     +-- leave  (Registry.leave, Hinweis an verbleibende Mitglieder)
//!     +-- disconnect (aus allen Raeumen entfernen, Hinweise)
//!
//! RoomRegistry     – Raum -> Menge von Verbindungen
//! EventBroadcaster – Send-Queue pro Verbindung
//! ```

pub mod broadcast;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod server;
pub mod server_state;

// Bequeme Re-Exporte
pub use broadcast::{EventBroadcaster, Zustellung};
pub use connection::ClientConnection;
pub use dispatcher::{ConnectionState, DispatcherContext, MessageDispatcher};
pub use error::{RelayError, RelayResult};
pub use registry::RoomRegistry;
pub use server::RelayServer;
pub use server_state::{RelayConfig, RelayState};
