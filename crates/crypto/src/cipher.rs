//! Authentifizierte Payload-Verschluesselung
//!
//! Verschluesselt Nachrichtentexte und Datei-Datensaetze mit dem
//! Raum-Schluessel bevor sie an das Relay gehen.
//!
//! ## Format (Base64, Standard-Alphabet)
//! ```text
//! [version(1)] [salt(16)] [nonce(12)] [ciphertext + auth_tag(16)]
//! ```
//!
//! ## Schluessel
//! ```text
//! aead_key = HKDF-SHA256(salt, raum_schluessel, info = "flurfunk-payload-v1")
//! ```
//!
//! ## AAD (Authenticated Additional Data)
//! ```text
//! [version(1)] [salt(16)]
//! ```

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Key, Nonce as AesNonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::{ChaCha20Poly1305, Key as ChaChaKey, Nonce as ChaChaNonce};
use flurfunk_protocol::FileRecord;
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use crate::error::{CryptoError, CryptoResult};
use crate::types::{Algorithmus, SecretBytes};

const SALT_LAENGE: usize = 16;
const NONCE_LAENGE: usize = 12;
const TAG_LAENGE: usize = 16;
const HEADER_LAENGE: usize = 1 + SALT_LAENGE + NONCE_LAENGE;
const SCHLUESSEL_LAENGE: usize = 32;
const HKDF_INFO: &[u8] = b"flurfunk-payload-v1";

/// Verschluesselt einen Klartext mit dem Raum-Schluessel (AES-256-GCM)
pub fn seal(plaintext: &str, key: &str) -> CryptoResult<String> {
    seal_mit(Algorithmus::default(), plaintext, key)
}

/// Verschluesselt einen Klartext mit explizit gewaehltem AEAD-Algorithmus
pub fn seal_mit(algorithmus: Algorithmus, plaintext: &str, key: &str) -> CryptoResult<String> {
    schluessel_pruefen(key)?;

    let mut salt = [0u8; SALT_LAENGE];
    OsRng.fill_bytes(&mut salt);
    let mut nonce = [0u8; NONCE_LAENGE];
    OsRng.fill_bytes(&mut nonce);

    let version = algorithmus.version();
    let aead_key = schluessel_ableiten(key, &salt)?;
    let aad = aad_bauen(version, &salt);

    let ciphertext = match algorithmus {
        Algorithmus::Aes256Gcm => {
            let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(aead_key.as_bytes()));
            cipher.encrypt(
                AesNonce::from_slice(&nonce),
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: &aad,
                },
            )
        }
        Algorithmus::ChaCha20Poly1305 => {
            let cipher = ChaCha20Poly1305::new(ChaChaKey::from_slice(aead_key.as_bytes()));
            cipher.encrypt(
                ChaChaNonce::from_slice(&nonce),
                chacha20poly1305::aead::Payload {
                    msg: plaintext.as_bytes(),
                    aad: &aad,
                },
            )
        }
    }
    .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

    let mut out = Vec::with_capacity(HEADER_LAENGE + ciphertext.len());
    out.push(version);
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);

    Ok(STANDARD.encode(out))
}

/// Entschluesselt einen mit `seal` erzeugten Ciphertext
///
/// Schlaegt mit `CryptoError::Entschluesselung` fehl wenn der Schluessel
/// nicht passt oder die Daten veraendert wurden. Es wird nie ein
/// (teilweise) falscher Klartext zurueckgegeben.
pub fn open(ciphertext: &str, key: &str) -> CryptoResult<String> {
    schluessel_pruefen(key)?;

    let bytes = STANDARD
        .decode(ciphertext.trim())
        .map_err(|_| CryptoError::Entschluesselung("ungueltiges Base64".into()))?;

    if bytes.len() < HEADER_LAENGE + TAG_LAENGE {
        return Err(CryptoError::Entschluesselung(format!(
            "Ciphertext zu kurz: {} Bytes",
            bytes.len()
        )));
    }

    let version = bytes[0];
    let algorithmus = Algorithmus::aus_version(version).ok_or_else(|| {
        CryptoError::Entschluesselung(format!("unbekannte Version 0x{version:02x}"))
    })?;

    let salt = &bytes[1..1 + SALT_LAENGE];
    let nonce = &bytes[1 + SALT_LAENGE..HEADER_LAENGE];
    let daten = &bytes[HEADER_LAENGE..];

    let aead_key = schluessel_ableiten(key, salt)?;
    let aad = aad_bauen(version, salt);

    let klartext = match algorithmus {
        Algorithmus::Aes256Gcm => {
            let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(aead_key.as_bytes()));
            cipher.decrypt(
                AesNonce::from_slice(nonce),
                Payload {
                    msg: daten,
                    aad: &aad,
                },
            )
        }
        Algorithmus::ChaCha20Poly1305 => {
            let cipher = ChaCha20Poly1305::new(ChaChaKey::from_slice(aead_key.as_bytes()));
            cipher.decrypt(
                ChaChaNonce::from_slice(nonce),
                chacha20poly1305::aead::Payload {
                    msg: daten,
                    aad: &aad,
                },
            )
        }
    }
    .map_err(|_| {
        CryptoError::Entschluesselung(
            "Auth-Tag ungueltig (falscher Schluessel oder veraenderte Daten)".into(),
        )
    })?;

    String::from_utf8(klartext)
        .map_err(|_| CryptoError::Entschluesselung("Klartext ist kein UTF-8".into()))
}

/// Serialisiert einen Datei-Datensatz als JSON und verschluesselt ihn
pub fn seal_file(record: &FileRecord, key: &str) -> CryptoResult<String> {
    let json = serde_json::to_string(record)
        .map_err(|e| CryptoError::Verschluesselung(format!("Datei-Datensatz: {e}")))?;
    seal(&json, key)
}

/// Entschluesselt einen Datei-Datensatz
///
/// Ein JSON-Fehler nach erfolgreichem `open` zaehlt ebenfalls als
/// Entschluesselungsfehler.
pub fn open_file(ciphertext: &str, key: &str) -> CryptoResult<FileRecord> {
    let json = open(ciphertext, key)?;
    serde_json::from_str(&json)
        .map_err(|e| CryptoError::Entschluesselung(format!("Datei-Datensatz ungueltig: {e}")))
}

fn schluessel_pruefen(key: &str) -> CryptoResult<()> {
    if key.is_empty() {
        return Err(CryptoError::LeererSchluessel);
    }
    Ok(())
}

fn schluessel_ableiten(key: &str, salt: &[u8]) -> CryptoResult<SecretBytes> {
    let hk = Hkdf::<Sha256>::new(Some(salt), key.as_bytes());
    let mut okm = vec![0u8; SCHLUESSEL_LAENGE];
    hk.expand(HKDF_INFO, &mut okm)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(SecretBytes::new(okm))
}

fn aad_bauen(version: u8, salt: &[u8]) -> Vec<u8> {
    let mut aad = Vec::with_capacity(1 + salt.len());
    aad.push(version);
    aad.extend_from_slice(salt);
    aad
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SCHLUESSEL: &str = "Qm7xT2pLk9VbN4rZ";

    fn test_datei() -> FileRecord {
        FileRecord {
            name: "bericht.pdf".into(),
            mime_type: "application/pdf".into(),
            base64_data: "JVBERi0xLjQK".into(),
            human_size: "9.00 Bytes".into(),
            fingerprint: "0123456789abcdef".into(),
        }
    }

    #[test]
    fn seal_open_round_trip() {
        for klartext in ["Hallo Raum!", "", "Umlaute: äöü ß – 🚀"] {
            let c = seal(klartext, SCHLUESSEL).unwrap();
            assert_eq!(open(&c, SCHLUESSEL).unwrap(), klartext);
        }
    }

    #[test]
    fn chacha20_round_trip() {
        let c = seal_mit(Algorithmus::ChaCha20Poly1305, "geheim", SCHLUESSEL).unwrap();
        let bytes = STANDARD.decode(&c).unwrap();
        assert_eq!(bytes[0], 0x02);
        assert_eq!(open(&c, SCHLUESSEL).unwrap(), "geheim");
    }

    #[test]
    fn falscher_schluessel_schlaegt_fehl() {
        let c = seal("nur fuer den Raum", SCHLUESSEL).unwrap();
        let fehler = open(&c, "ein-anderer-schluessel").unwrap_err();
        assert!(fehler.ist_entschluesselung());
        assert!(!fehler.to_string().contains("nur fuer den Raum"));
    }

    #[test]
    fn ciphertext_ist_nicht_deterministisch() {
        let a = seal("gleich", SCHLUESSEL).unwrap();
        let b = seal("gleich", SCHLUESSEL).unwrap();
        assert_ne!(a, b, "Salt und Nonce muessen pro Aufruf neu sein");
        assert!(!a.contains("gleich"));
    }

    #[test]
    fn manipulierter_ciphertext_wird_erkannt() {
        let c = seal("Betrag: 10 EUR", SCHLUESSEL).unwrap();
        let mut bytes = STANDARD.decode(&c).unwrap();
        let letztes = bytes.len() - 1;
        bytes[letztes] ^= 0x01;
        let manipuliert = STANDARD.encode(&bytes);
        assert!(open(&manipuliert, SCHLUESSEL).unwrap_err().ist_entschluesselung());

        // Salt veraendern (AAD) muss ebenfalls scheitern
        let mut bytes = STANDARD.decode(&c).unwrap();
        bytes[3] ^= 0x80;
        let manipuliert = STANDARD.encode(&bytes);
        assert!(open(&manipuliert, SCHLUESSEL).unwrap_err().ist_entschluesselung());
    }

    #[test]
    fn kaputte_eingaben_sind_entschluesselungsfehler() {
        assert!(open("%%%kein base64%%%", SCHLUESSEL)
            .unwrap_err()
            .ist_entschluesselung());
        assert!(open(&STANDARD.encode([0x01u8; 10]), SCHLUESSEL)
            .unwrap_err()
            .ist_entschluesselung());

        // Unbekanntes Versions-Byte
        let c = seal("x", SCHLUESSEL).unwrap();
        let mut bytes = STANDARD.decode(&c).unwrap();
        bytes[0] = 0x7f;
        assert!(open(&STANDARD.encode(&bytes), SCHLUESSEL)
            .unwrap_err()
            .ist_entschluesselung());
    }

    #[test]
    fn base64_kodierter_klartext_mit_schluesselsuffix_wird_abgelehnt() {
        // Altes Schema "btoa(text + '::' + key)" darf nicht als gueltig gelten
        let alt = STANDARD.encode(format!("hallo::{SCHLUESSEL}"));
        assert!(open(&alt, SCHLUESSEL).unwrap_err().ist_entschluesselung());
    }

    #[test]
    fn leerer_schluessel_wird_abgelehnt() {
        assert!(matches!(seal("x", ""), Err(CryptoError::LeererSchluessel)));
        assert!(matches!(open("x", ""), Err(CryptoError::LeererSchluessel)));
    }

    #[test]
    fn datei_datensatz_round_trip() {
        let record = test_datei();
        let c = seal_file(&record, SCHLUESSEL).unwrap();
        assert_eq!(open_file(&c, SCHLUESSEL).unwrap(), record);
        assert!(open_file(&c, "falsch").unwrap_err().ist_entschluesselung());
    }

    #[test]
    fn datei_mit_ungueltigem_json_ist_entschluesselungsfehler() {
        let c = seal("kein datensatz", SCHLUESSEL).unwrap();
        assert!(open_file(&c, SCHLUESSEL).unwrap_err().ist_entschluesselung());
    }
}
