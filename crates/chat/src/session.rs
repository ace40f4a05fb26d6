//! ChatSession – Verschluesselung an der Kante
//!
//! Die Session kennt Raum-ID, Raum-Schluessel und Nickname. Ausgehende
//! Nachrichten werden hier verschluesselt, eingehende hier entschluesselt.
//! Das Relay bekommt den Schluessel nie zu sehen.

use chrono::{DateTime, Utc};
use flurfunk_crypto::{open, open_file, seal, seal_file, RoomCredentials};
use flurfunk_protocol::{
    encode_join, encode_leave, encode_send, ClientEvent, ErrorCode, FileRecord, Payload,
    ServerEvent,
};

use crate::attachment::{rohdaten_pruefen, FileAttachment};
use crate::error::{ChatError, ChatResult};

/// Anzeige-Text fuer Payloads die nicht entschluesselt werden konnten
pub const PLATZHALTER_UNLESBAR: &str = "[could not decrypt]";

/// Inhalt eines Verlaufseintrags
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inhalt {
    /// Klartext-Hinweis des Relays (Beitritt/Verlassen)
    Hinweis(String),
    /// Entschluesselte Textnachricht
    Text(String),
    /// Entschluesselter und gepruefter Datei-Datensatz
    Datei(FileRecord),
    /// Payload mit falschem Schluessel oder beschaedigt
    Unlesbar,
    /// Fehler-Event vom Relay (wird nicht im Verlauf gespeichert)
    Fehler { code: ErrorCode, message: String },
}

/// Ein Eintrag im lokalen Chat-Verlauf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub zeit: DateTime<Utc>,
    /// Absender-Nickname, `None` bei Hinweisen und Fehlern
    pub absender: Option<String>,
    pub inhalt: Inhalt,
    /// Vom lokalen Teilnehmer selbst gesendet
    pub eigen: bool,
}

impl ChatEntry {
    fn neu(absender: Option<String>, inhalt: Inhalt, eigen: bool) -> Self {
        Self {
            zeit: Utc::now(),
            absender,
            inhalt,
            eigen,
        }
    }

    /// Anzeigbarer Text ohne Absender
    pub fn anzeige_text(&self) -> String {
        match &self.inhalt {
            Inhalt::Hinweis(text) | Inhalt::Text(text) => text.clone(),
            Inhalt::Datei(record) => format!(
                "[FILE] {} ({}, SHA-256: {})",
                record.name, record.human_size, record.fingerprint
            ),
            Inhalt::Unlesbar => PLATZHALTER_UNLESBAR.to_string(),
            Inhalt::Fehler { code, message } => format!("{code:?}: {message}"),
        }
    }

    /// Eine Zeile im Exportformat
    pub fn zeile(&self) -> String {
        match &self.inhalt {
            Inhalt::Hinweis(text) => format!("[NOTICE]: {text}"),
            Inhalt::Fehler { .. } => format!("[ERROR]: {}", self.anzeige_text()),
            _ => format!(
                "{}: {}",
                self.absender.as_deref().unwrap_or("?"),
                self.anzeige_text()
            ),
        }
    }

    pub fn ist_unlesbar(&self) -> bool {
        matches!(self.inhalt, Inhalt::Unlesbar)
    }
}

/// Chat-Sitzung eines Teilnehmers in genau einem Raum
pub struct ChatSession {
    zugang: RoomCredentials,
    verlauf: Vec<ChatEntry>,
}

impl ChatSession {
    pub fn neu(zugang: RoomCredentials) -> Self {
        Self {
            zugang,
            verlauf: Vec::new(),
        }
    }

    pub fn zugang(&self) -> &RoomCredentials {
        &self.zugang
    }

    pub fn nickname(&self) -> &str {
        &self.zugang.nickname
    }

    /// Lokaler Verlauf (eigene Nachrichten eingeschlossen, Fehler ausgeschlossen)
    pub fn verlauf(&self) -> &[ChatEntry] {
        &self.verlauf
    }

    pub fn join_event(&self) -> ClientEvent {
        encode_join(self.zugang.room_id.clone(), self.zugang.nickname.clone())
    }

    pub fn leave_event(&self) -> ClientEvent {
        encode_leave(self.zugang.room_id.clone(), self.zugang.nickname.clone())
    }

    /// Verschluesselt eine Textnachricht und nimmt sie in den Verlauf auf
    ///
    /// Das Relay schickt eigene Nachrichten nicht zurueck, daher wird der
    /// Eintrag hier lokal angelegt.
    pub fn text_event(&mut self, text: &str) -> ChatResult<ClientEvent> {
        if text.trim().is_empty() {
            return Err(ChatError::UngueltigeEingabe(
                "Nachricht darf nicht leer sein".into(),
            ));
        }

        let ciphertext = seal(text, &self.zugang.room_key)?;
        self.eigenen_eintrag(Inhalt::Text(text.to_string()));
        Ok(self.send_event(Payload::Text(ciphertext)))
    }

    /// Verschluesselt einen Datei-Anhang und nimmt ihn in den Verlauf auf
    pub fn file_event(&mut self, anhang: FileAttachment) -> ChatResult<ClientEvent> {
        let ciphertext = seal_file(anhang.record(), &self.zugang.room_key)?;
        self.eigenen_eintrag(Inhalt::Datei(anhang.into_record()));
        Ok(self.send_event(Payload::File(ciphertext)))
    }

    /// Verarbeitet ein Event vom Relay
    ///
    /// Schlaegt die Entschluesselung fehl, entsteht ein Eintrag mit dem
    /// Platzhalter `[could not decrypt]`. Es wird nie ein Panic ausgeloest.
    pub fn receive(&mut self, event: ServerEvent) -> ChatEntry {
        let eintrag = match event {
            ServerEvent::ReceiveNotice { text } => {
                ChatEntry::neu(None, Inhalt::Hinweis(text), false)
            }
            ServerEvent::ReceiveMessage { from, payload } => {
                let inhalt = self.entschluesseln(&from, &payload);
                ChatEntry::neu(Some(from), inhalt, false)
            }
            ServerEvent::Error { code, message } => {
                tracing::warn!(?code, %message, "Relay meldet Fehler");
                return ChatEntry::neu(None, Inhalt::Fehler { code, message }, false);
            }
        };

        self.verlauf.push(eintrag.clone());
        eintrag
    }

    fn entschluesseln(&self, from: &str, payload: &Payload) -> Inhalt {
        let key = &self.zugang.room_key;
        match payload {
            Payload::Text(ciphertext) => match open(ciphertext, key) {
                Ok(text) => Inhalt::Text(text),
                Err(e) => {
                    tracing::debug!(from = %from, fehler = %e, "Textnachricht nicht lesbar");
                    Inhalt::Unlesbar
                }
            },
            Payload::File(ciphertext) => match open_file(ciphertext, key) {
                Ok(record) if rohdaten_pruefen(&record).is_some() => Inhalt::Datei(record),
                Ok(record) => {
                    tracing::warn!(
                        from = %from,
                        name = %record.name,
                        "Fingerprint der Datei stimmt nicht"
                    );
                    Inhalt::Unlesbar
                }
                Err(e) => {
                    tracing::debug!(from = %from, fehler = %e, "Datei nicht lesbar");
                    Inhalt::Unlesbar
                }
            },
        }
    }

    fn send_event(&self, payload: Payload) -> ClientEvent {
        encode_send(
            self.zugang.room_id.clone(),
            self.zugang.nickname.clone(),
            payload,
        )
    }

    fn eigenen_eintrag(&mut self, inhalt: Inhalt) {
        let eintrag = ChatEntry::neu(Some(self.zugang.nickname.clone()), inhalt, true);
        self.verlauf.push(eintrag);
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("zugang", &self.zugang)
            .field("eintraege", &self.verlauf.len())
            .finish()
    }
}
