//! Kurzer SHA-256-Fingerprint fuer Datei-Inhalte

use sha2::{Digest, Sha256};

/// Anzahl Hex-Zeichen im Fingerprint (64 Bit)
pub const FINGERPRINT_LAENGE: usize = 16;

/// Berechnet den Fingerprint: die ersten 16 Hex-Zeichen von SHA-256(bytes)
pub fn fingerprint(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex.truncate(FINGERPRINT_LAENGE);
    hex
}

/// Prueft ob `bytes` zum erwarteten Fingerprint passen (Gross/Klein egal)
pub fn fingerprint_pruefen(bytes: &[u8], erwartet: &str) -> bool {
    fingerprint(bytes).eq_ignore_ascii_case(erwartet.trim())
}
