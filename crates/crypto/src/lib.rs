//! # flurfunk-crypto
//!
//! Client-seitige Kryptografie fuer Flurfunk. Das Relay bindet dieses
//! Crate nicht ein: es transportiert nur opake Strings.
//!
//! ## Module
//! - `cipher` - Authentifizierte Payload-Verschluesselung (seal/open)
//! - `fingerprint` - Kurzer SHA-256-Fingerprint fuer Dateien
//! - `credentials` - Zufaellige Raum-ID, Raum-Schluessel und Nickname
//! - `types` - Algorithmus-Auswahl und Schluessel-Container
//! - `error` - Fehlertypen

pub mod cipher;
pub mod credentials;
pub mod error;
pub mod fingerprint;
pub mod types;

// Bequeme Re-Exports
pub use cipher::{open, open_file, seal, seal_file, seal_mit};
pub use credentials::RoomCredentials;
pub use error::{CryptoError, CryptoResult};
pub use fingerprint::{fingerprint, fingerprint_pruefen};
pub use types::{Algorithmus, SecretBytes};
