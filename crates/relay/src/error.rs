//! Fehlertypen fuer das Relay

use flurfunk_core::RoomId;
use flurfunk_protocol::{EnvelopeError, ErrorCode, ServerEvent};
use thiserror::Error;

/// Fehlertyp fuer das Relay
#[derive(Debug, Error)]
pub enum RelayError {
    /// Verbindung ist nicht Mitglied des adressierten Raums
    #[error("Verbindung ist nicht Mitglied von {room}")]
    NotAMember { room: RoomId },

    /// Ungueltiger oder zu grosser Envelope
    #[error("{0}")]
    Envelope(#[from] EnvelopeError),
}

impl RelayError {
    /// Fehlercode auf dem Draht
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotAMember { .. } => ErrorCode::NotAMember,
            Self::Envelope(e) => e.code(),
        }
    }

    /// Label fuer `flurfunk_envelopes_rejected_total{reason}`
    pub fn grund(&self) -> &'static str {
        match self {
            Self::NotAMember { .. } => "not_a_member",
            Self::Envelope(EnvelopeError::Malformed(_)) => "malformed",
            Self::Envelope(EnvelopeError::TooLarge { .. }) => "too_large",
        }
    }

    /// `error`-Event fuer den Absender
    pub fn als_event(&self) -> ServerEvent {
        ServerEvent::fehler(self.code(), self.to_string())
    }
}

/// Result-Typ fuer das Relay
pub type RelayResult<T> = Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_und_gruende() {
        let e = RelayError::NotAMember {
            room: RoomId::new("geheimer-raum"),
        };
        assert_eq!(e.code(), ErrorCode::NotAMember);
        assert_eq!(e.grund(), "not_a_member");
        assert!(!e.to_string().contains("geheimer-raum"));

        let e = RelayError::from(EnvelopeError::TooLarge { size: 10, max: 5 });
        assert_eq!(e.code(), ErrorCode::EnvelopeTooLarge);
        assert_eq!(e.grund(), "too_large");
    }

    #[test]
    fn fehler_event() {
        let e = RelayError::from(EnvelopeError::Malformed("roomId fehlt".into()));
        match e.als_event() {
            ServerEvent::Error { code, message } => {
                assert_eq!(code, ErrorCode::MalformedEnvelope);
                assert!(message.contains("roomId fehlt"));
            }
            anderes => panic!("Fehler-Event erwartet: {anderes:?}"),
        }
    }
}
