//! Fehlertypen fuer das Kryptografie-Subsystem

use thiserror::Error;

/// Fehler im Kryptografie-Subsystem
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(String),

    /// Falscher Schluessel, manipulierte oder abgeschnittene Daten
    ///
    /// Enthaelt niemals Teile des Klartexts.
    #[error("Entschluesselung fehlgeschlagen: {0}")]
    Entschluesselung(String),

    #[error("Raum-Schluessel darf nicht leer sein")]
    LeererSchluessel,

    #[error("Key Derivation fehlgeschlagen: {0}")]
    KeyDerivation(String),
}

impl CryptoError {
    /// Gibt true zurueck wenn der Fehler beim Oeffnen eines Ciphertexts auftrat
    pub fn ist_entschluesselung(&self) -> bool {
        matches!(self, Self::Entschluesselung(_))
    }
}

pub type CryptoResult<T> = Result<T, CryptoError>;
