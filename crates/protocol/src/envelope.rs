//! Envelope-Codec (WebSocket-Textframes)
//!
//! Definiert alle Events die zwischen Client und Relay ausgetauscht werden.
//!
//! ## Design
//! - Ein JSON-Objekt pro WebSocket-Textframe
//! - Event-Name im Feld `event` (kebab-case), Felder in camelCase
//! - `text`/`file` sind opaker Ciphertext: der Codec prueft nur ob sie
//!   vorhanden sind, niemals ihren Inhalt
//!
//! ## Beispiel
//!
//! ```text
//! {"event":"join-room","roomId":"r1","nickname":"alice"}
//! {"event":"send-message","roomId":"r1","from":"alice","text":"<ciphertext>"}
//! {"event":"receive-notice","text":"alice joined the room"}
//! ```

use flurfunk_core::RoomId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Standard-Obergrenze fuer einen einzelnen Envelope (12 MB)
///
/// Eine 5-MB-Datei waechst durch Base64, JSON-Datensatz, AEAD-Tag und die
/// zweite Base64-Kodierung auf knapp 9 MB.
pub const DEFAULT_MAX_ENVELOPE_BYTES: usize = 12 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Fehler
// ---------------------------------------------------------------------------

/// Standardisierte Fehler-Codes fuer `error`-Events an den Absender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    MalformedEnvelope,
    EnvelopeTooLarge,
    NotAMember,
}

/// Fehler an der Codec-Grenze
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// Pflichtfeld fehlt, unbekanntes Event oder ungueltiges JSON
    #[error("malformed envelope: {0}")]
    Malformed(String),

    /// Rohdaten ueberschreiten die konfigurierte Obergrenze
    #[error("Envelope zu gross: {size} Bytes (Maximum: {max} Bytes)")]
    TooLarge { size: usize, max: usize },
}

impl EnvelopeError {
    fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Fehler-Code fuer die Rueckmeldung an den Absender
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Malformed(_) => ErrorCode::MalformedEnvelope,
            Self::TooLarge { .. } => ErrorCode::EnvelopeTooLarge,
        }
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Opaker Nutzinhalt einer Nachricht: genau einer von `text` oder `file`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Verschluesselter Nachrichtentext
    Text(String),
    /// Verschluesselter Datei-Datensatz (siehe `FileRecord`)
    File(String),
}

impl Payload {
    /// Gibt den opaken Ciphertext zurueck
    pub fn inhalt(&self) -> &str {
        match self {
            Self::Text(s) | Self::File(s) => s,
        }
    }

    pub fn ist_datei(&self) -> bool {
        matches!(self, Self::File(_))
    }

    fn in_felder(self) -> (Option<String>, Option<String>) {
        match self {
            Self::Text(t) => (Some(t), None),
            Self::File(f) => (None, Some(f)),
        }
    }

    fn aus_feldern(text: Option<String>, file: Option<String>) -> Result<Self, EnvelopeError> {
        match (text, file) {
            (Some(t), None) => Ok(Self::Text(t)),
            (None, Some(f)) => Ok(Self::File(f)),
            (Some(_), Some(_)) => Err(EnvelopeError::malformed(
                "text und file duerfen nicht gleichzeitig gesetzt sein",
            )),
            (None, None) => Err(EnvelopeError::malformed("text oder file fehlt")),
        }
    }
}

// ---------------------------------------------------------------------------
// Client -> Relay
// ---------------------------------------------------------------------------

/// Events die ein Client an das Relay sendet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Rahmen", try_from = "Rahmen")]
pub enum ClientEvent {
    /// `join-room {roomId, nickname}`
    JoinRoom { room_id: RoomId, nickname: String },
    /// `send-message {roomId, from, text | file}`
    SendMessage {
        room_id: RoomId,
        from: String,
        payload: Payload,
    },
    /// `leave-room {roomId, nickname}`
    LeaveRoom { room_id: RoomId, nickname: String },
}

impl ClientEvent {
    /// Raum auf den sich das Event bezieht
    pub fn room_id(&self) -> &RoomId {
        match self {
            Self::JoinRoom { room_id, .. }
            | Self::SendMessage { room_id, .. }
            | Self::LeaveRoom { room_id, .. } => room_id,
        }
    }

    /// Event-Name wie auf dem Draht
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "join-room",
            Self::SendMessage { .. } => "send-message",
            Self::LeaveRoom { .. } => "leave-room",
        }
    }

    /// Serialisiert das Event als JSON-Textframe
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Erstellt ein `join-room`-Event
pub fn encode_join(room_id: impl Into<RoomId>, nickname: impl Into<String>) -> ClientEvent {
    ClientEvent::JoinRoom {
        room_id: room_id.into(),
        nickname: nickname.into(),
    }
}

/// Erstellt ein `send-message`-Event mit bereits verschluesseltem Payload
pub fn encode_send(
    room_id: impl Into<RoomId>,
    from: impl Into<String>,
    payload: Payload,
) -> ClientEvent {
    ClientEvent::SendMessage {
        room_id: room_id.into(),
        from: from.into(),
        payload,
    }
}

/// Erstellt ein `leave-room`-Event
pub fn encode_leave(room_id: impl Into<RoomId>, nickname: impl Into<String>) -> ClientEvent {
    ClientEvent::LeaveRoom {
        room_id: room_id.into(),
        nickname: nickname.into(),
    }
}

/// Dekodiert einen rohen Textframe in ein Client-Event
///
/// Der opake Payload wird unveraendert uebernommen.
pub fn decode(raw: &str) -> Result<ClientEvent, EnvelopeError> {
    let rahmen: Rahmen = serde_json::from_str(raw)
        .map_err(|e| EnvelopeError::malformed(format!("ungueltiges JSON: {e}")))?;
    ClientEvent::try_from(rahmen)
}

/// Wie `decode`, lehnt aber Frames ueber `max_bytes` vor dem Parsen ab
pub fn decode_begrenzt(raw: &str, max_bytes: usize) -> Result<ClientEvent, EnvelopeError> {
    if raw.len() > max_bytes {
        return Err(EnvelopeError::TooLarge {
            size: raw.len(),
            max: max_bytes,
        });
    }
    decode(raw)
}

// ---------------------------------------------------------------------------
// Relay -> Client
// ---------------------------------------------------------------------------

/// Events die das Relay an Clients zustellt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Rahmen", try_from = "Rahmen")]
pub enum ServerEvent {
    /// `receive-message {from, text | file}` – Payload unveraendert weitergeleitet
    ReceiveMessage { from: String, payload: Payload },
    /// `receive-notice {text}` – Klartext-Hinweis des Relays
    ReceiveNotice { text: String },
    /// `error {code, message}` – geht nur an den Absender der fehlerhaften Anfrage
    Error { code: ErrorCode, message: String },
}

impl ServerEvent {
    /// Hinweis "`nickname` joined the room"
    pub fn beigetreten(nickname: &str) -> Self {
        Self::ReceiveNotice {
            text: format!("{nickname} joined the room"),
        }
    }

    /// Hinweis "`nickname` left the room"
    pub fn verlassen(nickname: &str) -> Self {
        Self::ReceiveNotice {
            text: format!("{nickname} left the room"),
        }
    }

    /// Erstellt ein Fehler-Event
    pub fn fehler(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Dekodiert einen Textframe vom Relay (Client-Seite)
    pub fn decode(raw: &str) -> Result<Self, EnvelopeError> {
        let rahmen: Rahmen = serde_json::from_str(raw)
            .map_err(|e| EnvelopeError::malformed(format!("ungueltiges JSON: {e}")))?;
        Self::try_from(rahmen)
    }
}

// ---------------------------------------------------------------------------
// Draht-Rahmen
// ---------------------------------------------------------------------------

/// Flache Draht-Darstellung aller Events
///
/// Alle Felder sind optional, damit fehlende Pflichtfelder als
/// `EnvelopeError::Malformed` gemeldet werden statt als serde-Fehler.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Rahmen {
    event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    room_id: Option<RoomId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    code: Option<ErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

fn pflicht(wert: Option<String>, feld: &str) -> Result<String, EnvelopeError> {
    match wert {
        Some(w) if !w.trim().is_empty() => Ok(w),
        _ => Err(EnvelopeError::malformed(format!("{feld} fehlt"))),
    }
}

fn pflicht_raum(wert: Option<RoomId>) -> Result<RoomId, EnvelopeError> {
    match wert {
        Some(r) if !r.ist_leer() => Ok(r),
        _ => Err(EnvelopeError::malformed("roomId fehlt")),
    }
}

impl From<ClientEvent> for Rahmen {
    fn from(event: ClientEvent) -> Self {
        let name = event.name().to_string();
        match event {
            ClientEvent::JoinRoom { room_id, nickname }
            | ClientEvent::LeaveRoom { room_id, nickname } => Self {
                event: name,
                room_id: Some(room_id),
                nickname: Some(nickname),
                ..Default::default()
            },
            ClientEvent::SendMessage {
                room_id,
                from,
                payload,
            } => {
                let (text, file) = payload.in_felder();
                Self {
                    event: name,
                    room_id: Some(room_id),
                    from: Some(from),
                    text,
                    file,
                    ..Default::default()
                }
            }
        }
    }
}

impl TryFrom<Rahmen> for ClientEvent {
    type Error = EnvelopeError;

    fn try_from(r: Rahmen) -> Result<Self, EnvelopeError> {
        match r.event.as_str() {
            "join-room" => Ok(Self::JoinRoom {
                room_id: pflicht_raum(r.room_id)?,
                nickname: pflicht(r.nickname, "nickname")?,
            }),
            "send-message" => Ok(Self::SendMessage {
                room_id: pflicht_raum(r.room_id)?,
                from: pflicht(r.from, "from")?,
                payload: Payload::aus_feldern(r.text, r.file)?,
            }),
            "leave-room" => Ok(Self::LeaveRoom {
                room_id: pflicht_raum(r.room_id)?,
                nickname: pflicht(r.nickname, "nickname")?,
            }),
            anderes => Err(EnvelopeError::malformed(format!(
                "unbekanntes Event '{anderes}'"
            ))),
        }
    }
}

impl From<ServerEvent> for Rahmen {
    fn from(event: ServerEvent) -> Self {
        match event {
            ServerEvent::ReceiveMessage { from, payload } => {
                let (text, file) = payload.in_felder();
                Self {
                    event: "receive-message".into(),
                    from: Some(from),
                    text,
                    file,
                    ..Default::default()
                }
            }
            ServerEvent::ReceiveNotice { text } => Self {
                event: "receive-notice".into(),
                text: Some(text),
                ..Default::default()
            },
            ServerEvent::Error { code, message } => Self {
                event: "error".into(),
                code: Some(code),
                message: Some(message),
                ..Default::default()
            },
        }
    }
}

impl TryFrom<Rahmen> for ServerEvent {
    type Error = EnvelopeError;

    fn try_from(r: Rahmen) -> Result<Self, EnvelopeError> {
        match r.event.as_str() {
            "receive-message" => Ok(Self::ReceiveMessage {
                from: pflicht(r.from, "from")?,
                payload: Payload::aus_feldern(r.text, r.file)?,
            }),
            "receive-notice" => Ok(Self::ReceiveNotice {
                text: r
                    .text
                    .ok_or_else(|| EnvelopeError::malformed("text fehlt"))?,
            }),
            "error" => Ok(Self::Error {
                code: r
                    .code
                    .ok_or_else(|| EnvelopeError::malformed("code fehlt"))?,
                message: r.message.unwrap_or_default(),
            }),
            anderes => Err(EnvelopeError::malformed(format!(
                "unbekanntes Event '{anderes}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
