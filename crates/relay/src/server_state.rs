//! Gemeinsamer Relay-Zustand
//!
//! Haelt Registry, Broadcaster und Metriken einer Relay-Instanz. Es gibt
//! keine prozessweite Raum-Tabelle: mehrere Relays in einem Prozess sind
//! voneinander isoliert.

use flurfunk_observability::FlurfunkMetrics;
use flurfunk_protocol::DEFAULT_MAX_ENVELOPE_BYTES;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::broadcast::{EventBroadcaster, Zustellung, SEND_QUEUE_GROESSE};
use crate::registry::RoomRegistry;

/// Konfiguration fuer das Relay
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Maximale gleichzeitige WebSocket-Verbindungen
    pub max_verbindungen: usize,
    /// Obergrenze fuer einen einzelnen Envelope in Bytes
    pub max_envelope_bytes: usize,
    /// Groesse der Send-Queue pro Verbindung
    pub sende_queue_groesse: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_verbindungen: 1024,
            max_envelope_bytes: DEFAULT_MAX_ENVELOPE_BYTES,
            sende_queue_groesse: SEND_QUEUE_GROESSE,
        }
    }
}

/// Gemeinsamer Relay-Zustand (thread-safe, Arc-geteilt)
pub struct RelayState {
    pub config: RelayConfig,
    /// Raum -> Mitglieder
    pub registry: RoomRegistry,
    /// Send-Queues der verbundenen Clients
    pub broadcaster: EventBroadcaster,
    pub metriken: FlurfunkMetrics,
    /// Ein Permit pro offener Verbindung (`max_verbindungen` insgesamt)
    verbindungs_slots: Arc<Semaphore>,
}

impl RelayState {
    /// Erstellt einen neuen RelayState
    pub fn neu(config: RelayConfig, metriken: FlurfunkMetrics) -> Arc<Self> {
        let broadcaster = EventBroadcaster::neu(config.sende_queue_groesse);
        let verbindungs_slots = Arc::new(Semaphore::new(config.max_verbindungen));
        Arc::new(Self {
            config,
            registry: RoomRegistry::neu(),
            broadcaster,
            metriken,
            verbindungs_slots,
        })
    }

    /// Belegt einen Verbindungs-Slot, `None` wenn das Relay voll ist
    ///
    /// Der Slot wird mit dem Permit freigegeben.
    pub fn slot_belegen(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.verbindungs_slots).try_acquire_owned().ok()
    }

    /// Uebertraegt Raum- und Verbindungsanzahl in die Gauges
    pub fn gauges_aktualisieren(&self) {
        self.metriken
            .rooms_active
            .set(self.registry.room_count() as i64);
        self.metriken
            .connected_clients
            .set(self.broadcaster.client_anzahl() as i64);
    }

    /// Zaehlt verworfene Zustellungen
    pub fn zustellung_erfassen(&self, zustellung: Zustellung) {
        if zustellung.verworfen > 0 {
            self.metriken
                .deliveries_dropped_total
                .inc_by(zustellung.verworfen as u64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(max_verbindungen: usize) -> Arc<RelayState> {
        let config = RelayConfig {
            max_verbindungen,
            ..RelayConfig::default()
        };
        RelayState::neu(config, FlurfunkMetrics::neu().unwrap())
    }

    #[test]
    fn slots_sind_begrenzt_und_werden_freigegeben() {
        let state = state(2);
        let a = state.slot_belegen().expect("erster Slot");
        let _b = state.slot_belegen().expect("zweiter Slot");
        assert!(state.slot_belegen().is_none());

        drop(a);
        assert!(state.slot_belegen().is_some());
    }

    #[test]
    fn slots_unter_gleichzeitigem_zugriff() {
        let state = state(3);
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let state = Arc::clone(&state);
                std::thread::spawn(move || state.slot_belegen())
            })
            .collect();
        let belegt: Vec<_> = handles
            .into_iter()
            .filter_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(belegt.len(), 3);
    }

    #[test]
    fn verworfene_zustellungen_werden_gezaehlt() {
        let state = state(1);
        state.zustellung_erfassen(Zustellung {
            gesendet: 2,
            verworfen: 3,
        });
        assert_eq!(state.metriken.deliveries_dropped_total.get(), 3);
    }
}
