//! Datei-Anhaenge vor der Verschluesselung

use base64::{engine::general_purpose::STANDARD, Engine as _};
use flurfunk_crypto::fingerprint;
use flurfunk_protocol::FileRecord;

use crate::error::{ChatError, ChatResult};
use crate::size::human_size;

/// Maximale Rohgroesse eines Anhangs (5 MiB)
pub const MAX_DATEI_BYTES: u64 = 5 * 1024 * 1024;

/// Ein zum Versand vorbereiteter Datei-Anhang
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    record: FileRecord,
    groesse: u64,
}

impl FileAttachment {
    /// Baut einen Anhang aus Rohdaten
    ///
    /// Dateien ueber 5 MiB werden mit `ChatError::DateiZuGross` abgelehnt,
    /// bevor irgendetwas kodiert oder verschluesselt wird.
    pub fn from_bytes(name: &str, mime_type: &str, bytes: &[u8]) -> ChatResult<Self> {
        if name.trim().is_empty() {
            return Err(ChatError::UngueltigeEingabe(
                "Dateiname darf nicht leer sein".into(),
            ));
        }

        let groesse = bytes.len() as u64;
        if groesse > MAX_DATEI_BYTES {
            return Err(ChatError::DateiZuGross {
                size: groesse,
                max: MAX_DATEI_BYTES,
            });
        }

        let record = FileRecord {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            base64_data: STANDARD.encode(bytes),
            human_size: human_size(groesse),
            fingerprint: fingerprint(bytes),
        };

        tracing::debug!(
            name = %record.name,
            bytes = groesse,
            fingerprint = %record.fingerprint,
            "Anhang vorbereitet"
        );

        Ok(Self { record, groesse })
    }

    /// Liest eine Datei von der Platte und baut daraus einen Anhang
    pub async fn aus_datei(pfad: impl AsRef<std::path::Path>, mime_type: &str) -> ChatResult<Self> {
        let pfad = pfad.as_ref();
        let meta = tokio::fs::metadata(pfad).await?;
        if meta.len() > MAX_DATEI_BYTES {
            return Err(ChatError::DateiZuGross {
                size: meta.len(),
                max: MAX_DATEI_BYTES,
            });
        }

        let name = pfad
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let daten = tokio::fs::read(pfad).await?;
        Self::from_bytes(&name, mime_type, &daten)
    }

    pub fn record(&self) -> &FileRecord {
        &self.record
    }

    /// Rohgroesse in Bytes
    pub fn groesse(&self) -> u64 {
        self.groesse
    }

    pub fn into_record(self) -> FileRecord {
        self.record
    }
}

/// Dekodiert die Rohdaten eines empfangenen Datensatzes und prueft den Fingerprint
///
/// Gibt `None` zurueck wenn Base64 oder Fingerprint nicht stimmen.
pub fn rohdaten_pruefen(record: &FileRecord) -> Option<Vec<u8>> {
    let daten = STANDARD.decode(&record.base64_data).ok()?;
    flurfunk_crypto::fingerprint_pruefen(&daten, &record.fingerprint).then_some(daten)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anhang_enthaelt_alle_felder() {
        let a = FileAttachment::from_bytes("hello.txt", "text/plain", b"Hello").unwrap();
        let r = a.record();
        assert_eq!(r.name, "hello.txt");
        assert_eq!(r.mime_type, "text/plain");
        assert_eq!(r.base64_data, "SGVsbG8=");
        assert_eq!(r.human_size, "5.00 Bytes");
        assert_eq!(r.fingerprint, "185f8db32271fe25");
        assert_eq!(a.groesse(), 5);
    }

    #[test]
    fn genau_fuenf_mib_sind_erlaubt() {
        let daten = vec![0u8; MAX_DATEI_BYTES as usize];
        let a = FileAttachment::from_bytes("gross.bin", "", &daten).unwrap();
        assert_eq!(a.record().human_size, "5.00 MB");
    }

    #[test]
    fn ueber_fuenf_mib_wird_abgelehnt() {
        let daten = vec![0u8; MAX_DATEI_BYTES as usize + 1];
        match FileAttachment::from_bytes("zu_gross.bin", "", &daten) {
            Err(ChatError::DateiZuGross { size, max }) => {
                assert_eq!(size, MAX_DATEI_BYTES + 1);
                assert_eq!(max, MAX_DATEI_BYTES);
            }
            anderes => panic!("DateiZuGross erwartet, erhalten: {anderes:?}"),
        }
    }

    #[test]
    fn leerer_dateiname_wird_abgelehnt() {
        assert!(matches!(
            FileAttachment::from_bytes("  ", "text/plain", b"x"),
            Err(ChatError::UngueltigeEingabe(_))
        ));
    }

    #[test]
    fn rohdaten_pruefung_erkennt_manipulation() {
        let a = FileAttachment::from_bytes("a.txt", "text/plain", b"Hello").unwrap();
        assert_eq!(rohdaten_pruefen(a.record()).unwrap(), b"Hello");

        let mut r = a.into_record();
        r.base64_data = STANDARD.encode(b"Hellp");
        assert!(rohdaten_pruefen(&r).is_none());
        r.base64_data = "%%%".into();
        assert!(rohdaten_pruefen(&r).is_none());
    }
}
