//! flurfunk-protocol – Envelope-Definitionen
//!
//! Dieses Crate definiert alle Events die zwischen Client und Relay ueber
//! den WebSocket ausgetauscht werden, sowie den Klartext-Datensatz einer
//! Datei bevor er verschluesselt wird.

pub mod envelope;
pub mod file;

pub use envelope::{
    decode, decode_begrenzt, encode_join, encode_leave, encode_send, ClientEvent, EnvelopeError,
    ErrorCode, Payload, ServerEvent, DEFAULT_MAX_ENVELOPE_BYTES,
};
pub use file::FileRecord;
