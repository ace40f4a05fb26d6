//! Verlaufsexport als Textdatei

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};

use crate::error::ChatResult;
use crate::session::ChatEntry;

const KOPFZEILE: &str = "--- Chat History ---";

/// Baut den Export-Text aus dem Verlauf
///
/// Fehler-Eintraege werden uebersprungen.
pub fn transcript(eintraege: &[ChatEntry]) -> String {
    let mut text = format!("{KOPFZEILE}\n\n");
    for eintrag in eintraege {
        if matches!(eintrag.inhalt, crate::session::Inhalt::Fehler { .. }) {
            continue;
        }
        text.push_str(&eintrag.zeile());
        text.push('\n');
    }
    text
}

/// Dateiname `chat_export_YYYY-MM-DD.txt`
pub fn export_dateiname(datum: NaiveDate) -> String {
    format!("chat_export_{}.txt", datum.format("%Y-%m-%d"))
}

/// Schreibt den Verlauf in `verzeichnis/chat_export_<heute>.txt`
pub async fn exportieren(
    eintraege: &[ChatEntry],
    verzeichnis: impl AsRef<Path>,
) -> ChatResult<PathBuf> {
    let verzeichnis = verzeichnis.as_ref();
    tokio::fs::create_dir_all(verzeichnis).await?;

    let pfad = verzeichnis.join(export_dateiname(Utc::now().date_naive()));
    let inhalt = transcript(eintraege);
    tokio::fs::write(&pfad, inhalt.as_bytes()).await?;

    tracing::info!(
        pfad = %pfad.display(),
        eintraege = eintraege.len(),
        "Chat-Verlauf exportiert"
    );
    Ok(pfad)
}
