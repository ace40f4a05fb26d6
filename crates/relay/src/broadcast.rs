//! Event-Broadcaster – Send-Queues aller verbundenen Clients
//!
//! Jede Verbindung bekommt eine begrenzte mpsc-Queue. Zugestellt wird mit
//! `try_send`: ist die Queue eines Empfaengers voll oder geschlossen, geht
//! die Nachricht nur fuer diesen Empfaenger verloren (hoechstens einmal,
//! keine Wiederholung).
//!
//! Events werden einmal serialisiert und als `Arc<str>` an alle
//! Empfaenger verteilt.

use dashmap::DashMap;
use flurfunk_core::ConnectionId;
use flurfunk_protocol::ServerEvent;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Standard-Groesse der Send-Queue pro Client
pub const SEND_QUEUE_GROESSE: usize = 64;

/// Ein serialisierter Textframe in der Send-Queue
pub type Ausgehend = Arc<str>;

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue eines verbundenen Clients
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub conn_id: ConnectionId,
    pub tx: mpsc::Sender<Ausgehend>,
}

impl ClientSender {
    /// Sendet einen Frame nicht-blockierend an den Client
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    pub fn senden(&self, frame: Ausgehend) -> bool {
        match self.tx.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn = %self.conn_id, "Send-Queue voll – Nachricht verworfen");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(conn = %self.conn_id, "Send-Queue geschlossen (Client getrennt)");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Zustellung
// ---------------------------------------------------------------------------

/// Ergebnis einer Verteilung an mehrere Empfaenger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Zustellung {
    pub gesendet: usize,
    pub verworfen: usize,
}

// ---------------------------------------------------------------------------
// EventBroadcaster
// ---------------------------------------------------------------------------

/// Zentraler Event-Broadcaster fuer alle verbundenen Clients
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct EventBroadcaster {
    inner: Arc<EventBroadcasterInner>,
}

struct EventBroadcasterInner {
    /// Client-Sender, indiziert nach ConnectionId
    clients: DashMap<ConnectionId, ClientSender>,
    queue_groesse: usize,
}

impl EventBroadcaster {
    /// Erstellt einen neuen EventBroadcaster mit der angegebenen Queue-Groesse
    pub fn neu(queue_groesse: usize) -> Self {
        Self {
            inner: Arc::new(EventBroadcasterInner {
                clients: DashMap::new(),
                queue_groesse: queue_groesse.max(1),
            }),
        }
    }

    /// Registriert einen neuen Client und gibt seine Empfangs-Queue zurueck
    ///
    /// Die `ClientConnection` liest aus dieser Queue und sendet via WebSocket.
    pub fn client_registrieren(&self, conn_id: ConnectionId) -> mpsc::Receiver<Ausgehend> {
        let (tx, rx) = mpsc::channel(self.inner.queue_groesse);
        let sender = ClientSender { conn_id, tx };
        self.inner.clients.insert(conn_id, sender);
        tracing::debug!(conn = %conn_id, "Client im Broadcaster registriert");
        rx
    }

    /// Entfernt einen Client aus dem Broadcaster
    pub fn client_entfernen(&self, conn_id: &ConnectionId) {
        self.inner.clients.remove(conn_id);
        tracing::debug!(conn = %conn_id, "Client aus Broadcaster entfernt");
    }

    /// Serialisiert ein Event zu einem Textframe
    pub fn frame(event: &ServerEvent) -> Option<Ausgehend> {
        match event.to_json() {
            Ok(json) => Some(Arc::from(json)),
            Err(e) => {
                tracing::error!(fehler = %e, "Event konnte nicht serialisiert werden");
                None
            }
        }
    }

    /// Sendet ein Event an einen einzelnen Client
    ///
    /// Gibt `true` zurueck wenn der Client gefunden und das Event eingereiht wurde.
    pub fn an_client_senden(&self, conn_id: &ConnectionId, event: &ServerEvent) -> bool {
        let Some(frame) = Self::frame(event) else {
            return false;
        };
        match self.inner.clients.get(conn_id) {
            Some(sender) => sender.senden(frame),
            None => {
                tracing::debug!(conn = %conn_id, "Senden an unbekannten Client");
                false
            }
        }
    }

    /// Sendet ein Event an alle Mitglieder ausser einem
    ///
    /// Nuetzlich um Nachrichten und Beitritts-/Verlassen-Hinweise zu
    /// verteilen ohne den Ausloeser zu informieren.
    pub fn an_mitglieder_ausser_senden(
        &self,
        mitglieder: &HashSet<ConnectionId>,
        ausgeschlossen: &ConnectionId,
        event: &ServerEvent,
    ) -> Zustellung {
        let mut zustellung = Zustellung::default();
        if mitglieder.iter().all(|m| m == ausgeschlossen) {
            return zustellung;
        }
        let Some(frame) = Self::frame(event) else {
            return zustellung;
        };

        for conn_id in mitglieder {
            if conn_id == ausgeschlossen {
                continue;
            }
            let zugestellt = self
                .inner
                .clients
                .get(conn_id)
                .is_some_and(|sender| sender.senden(Arc::clone(&frame)));
            if zugestellt {
                zustellung.gesendet += 1;
            } else {
                zustellung.verworfen += 1;
            }
        }
        zustellung
    }

    /// Gibt die Anzahl der registrierten Clients zurueck
    pub fn client_anzahl(&self) -> usize {
        self.inner.clients.len()
    }

    /// Prueft ob ein Client registriert ist
    pub fn ist_registriert(&self, conn_id: &ConnectionId) -> bool {
        self.inner.clients.contains_key(conn_id)
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::neu(SEND_QUEUE_GROESSE)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn empfangen(rx: &mut mpsc::Receiver<Ausgehend>) -> ServerEvent {
        let frame = rx.try_recv().expect("Frame muss vorhanden sein");
        ServerEvent::decode(&frame).expect("Frame muss dekodierbar sein")
    }

    #[tokio::test]
    async fn client_registrieren_und_senden() {
        let broadcaster = EventBroadcaster::default();
        let conn = ConnectionId::new();

        let mut rx = broadcaster.client_registrieren(conn);
        assert!(broadcaster.ist_registriert(&conn));

        assert!(broadcaster.an_client_senden(&conn, &ServerEvent::beigetreten("alice")));
        assert_eq!(empfangen(&mut rx), ServerEvent::beigetreten("alice"));
    }

    #[tokio::test]
    async fn an_mitglieder_ausser_senden() {
        let broadcaster = EventBroadcaster::default();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let c = ConnectionId::new(); // nicht im Raum

        let mut rx_a = broadcaster.client_registrieren(a);
        let mut rx_b = broadcaster.client_registrieren(b);
        let mut rx_c = broadcaster.client_registrieren(c);

        let mitglieder = HashSet::from([a, b]);
        let z = broadcaster.an_mitglieder_ausser_senden(
            &mitglieder,
            &a,
            &ServerEvent::verlassen("x"),
        );
        assert_eq!(z, Zustellung { gesendet: 1, verworfen: 0 });

        assert!(rx_a.try_recv().is_err(), "Ausloeser darf nichts empfangen");
        assert_eq!(empfangen(&mut rx_b), ServerEvent::verlassen("x"));
        assert!(rx_c.try_recv().is_err(), "Nicht-Mitglied darf nichts empfangen");
    }

    #[tokio::test]
    async fn volle_queue_verwirft_nur_fuer_diesen_empfaenger() {
        let broadcaster = EventBroadcaster::neu(2);
        let sender = ConnectionId::new();
        let langsam = ConnectionId::new();
        let schnell = ConnectionId::new();

        let _rx_sender = broadcaster.client_registrieren(sender);
        let _rx_langsam = broadcaster.client_registrieren(langsam);
        let mut rx_schnell = broadcaster.client_registrieren(schnell);

        let mitglieder = HashSet::from([sender, langsam, schnell]);
        let event = ServerEvent::beigetreten("n");

        for _ in 0..2 {
            let z = broadcaster.an_mitglieder_ausser_senden(&mitglieder, &sender, &event);
            assert_eq!(z.gesendet, 2);
            rx_schnell.try_recv().unwrap();
        }

        // Queue von `langsam` ist jetzt voll
        let z = broadcaster.an_mitglieder_ausser_senden(&mitglieder, &sender, &event);
        assert_eq!(z, Zustellung { gesendet: 1, verworfen: 1 });
        assert!(rx_schnell.try_recv().is_ok());
    }

    #[tokio::test]
    async fn geschlossene_queue_zaehlt_als_verworfen() {
        let broadcaster = EventBroadcaster::default();
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        let rx_b = broadcaster.client_registrieren(b);
        drop(rx_b);

        let z = broadcaster.an_mitglieder_ausser_senden(
            &HashSet::from([a, b]),
            &a,
            &ServerEvent::beigetreten("a"),
        );
        assert_eq!(z.verworfen, 1);
    }

    #[test]
    fn client_entfernen() {
        let broadcaster = EventBroadcaster::default();
        let conn = ConnectionId::new();

        let _rx = broadcaster.client_registrieren(conn);
        assert_eq!(broadcaster.client_anzahl(), 1);

        broadcaster.client_entfernen(&conn);
        assert!(!broadcaster.ist_registriert(&conn));
        assert!(!broadcaster.an_client_senden(&conn, &ServerEvent::beigetreten("x")));
    }
}
