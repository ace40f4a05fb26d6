//! Klartext-Datensatz einer Datei-Nachricht
//!
//! Der Datensatz wird als JSON serialisiert und danach als Ganzes
//! verschluesselt. Auf dem Draht erscheint er nur als opaker `file`-String.

use serde::{Deserialize, Serialize};

/// Datei-Datensatz vor der Verschluesselung
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Original-Dateiname
    pub name: String,
    /// MIME-Typ (kann leer sein wenn unbekannt)
    pub mime_type: String,
    /// Dateiinhalt, Base64-kodiert (Standard-Alphabet mit Padding)
    pub base64_data: String,
    /// Lesbare Groesse, z.B. "1.50 KB"
    pub human_size: String,
    /// Kurzer SHA-256-Fingerprint der Rohdaten
    pub fingerprint: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feldnamen_in_camel_case() {
        let record = FileRecord {
            name: "hello.txt".into(),
            mime_type: "text/plain".into(),
            base64_data: "SGVsbG8=".into(),
            human_size: "5.00 Bytes".into(),
            fingerprint: "185f8db32271fe25".into(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains(r#""mimeType":"text/plain""#));
        assert!(json.contains(r#""base64Data":"SGVsbG8=""#));
        assert!(json.contains(r#""humanSize":"5.00 Bytes""#));

        let zurueck: FileRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(zurueck, record);
    }
}
