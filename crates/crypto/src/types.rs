//! Gemeinsame Typen fuer das Kryptografie-Subsystem

use serde::{Deserialize, Serialize};

/// Sicherer Schluessel-Container (wird beim Drop genullt)
#[derive(Clone)]
pub struct SecretBytes(pub Vec<u8>);

impl Drop for SecretBytes {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretBytes([REDACTED] {} bytes)", self.0.len())
    }
}

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// AEAD-Algorithmus eines Ciphertexts
///
/// Das erste Byte jedes Ciphertexts kodiert den Algorithmus, `open`
/// waehlt daher automatisch den richtigen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Algorithmus {
    #[default]
    Aes256Gcm,
    ChaCha20Poly1305,
}

impl Algorithmus {
    /// Versions-Byte im Ciphertext-Header
    pub fn version(self) -> u8 {
        match self {
            Self::Aes256Gcm => 0x01,
            Self::ChaCha20Poly1305 => 0x02,
        }
    }

    /// Liest den Algorithmus aus dem Versions-Byte
    pub fn aus_version(version: u8) -> Option<Self> {
        match version {
            0x01 => Some(Self::Aes256Gcm),
            0x02 => Some(Self::ChaCha20Poly1305),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_bytes_debug_ist_geschwaerzt() {
        let s = SecretBytes::new(vec![1, 2, 3]);
        let text = format!("{s:?}");
        assert!(text.contains("REDACTED"));
        assert!(!text.contains("[1, 2, 3]"));
    }

    #[test]
    fn versions_byte_eindeutig() {
        for alg in [Algorithmus::Aes256Gcm, Algorithmus::ChaCha20Poly1305] {
            assert_eq!(Algorithmus::aus_version(alg.version()), Some(alg));
        }
        assert_eq!(Algorithmus::aus_version(0x00), None);
        assert_eq!(Algorithmus::aus_version(0xff), None);
    }
}
