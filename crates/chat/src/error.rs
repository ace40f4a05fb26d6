//! Fehlertypen fuer das Chat-Crate

use thiserror::Error;

/// Chat-Fehlertypen
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Datei zu gross: {size} Bytes (Maximum: {max} Bytes)")]
    DateiZuGross { size: u64, max: u64 },

    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    #[error("Krypto-Fehler: {0}")]
    Krypto(#[from] flurfunk_crypto::CryptoError),

    #[error("Protokoll-Fehler: {0}")]
    Protokoll(#[from] flurfunk_protocol::EnvelopeError),

    #[error("Serialisierungs-Fehler: {0}")]
    Serialisierung(#[from] serde_json::Error),

    #[error("Verbindungs-Fehler: {0}")]
    Verbindung(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

pub type ChatResult<T> = Result<T, ChatError>;
