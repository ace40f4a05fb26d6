//! Raum-Verwaltung – Welche Verbindung ist in welchem Raum
//!
//! Ein einziger Mutex schuetzt die gesamte Zuordnung, jede
//! Lese-Aenderungs-Schreib-Folge ist damit atomar. Der Lock wird nie
//! ueber ein `.await` gehalten.
//!
//! Die Registry kennt nur Mengen-Semantik. Dass eine Verbindung
//! hoechstens in einem Raum ist, setzt der Dispatcher durch.

use flurfunk_core::{ConnectionId, RoomId};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// Raum-Zuordnung: RoomId -> Menge von Verbindungen
///
/// Raeume entstehen beim ersten Beitritt und verschwinden, sobald das
/// letzte Mitglied sie verlaesst.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    raeume: Mutex<HashMap<RoomId, HashSet<ConnectionId>>>,
}

impl RoomRegistry {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Fuegt eine Verbindung einem Raum hinzu (legt den Raum bei Bedarf an)
    ///
    /// Gibt `false` zurueck wenn die Verbindung bereits Mitglied war.
    pub fn join(&self, room: &RoomId, conn: ConnectionId) -> bool {
        let mut raeume = self.raeume.lock();
        raeume.entry(room.clone()).or_default().insert(conn)
    }

    /// Entfernt eine Verbindung aus einem Raum
    ///
    /// Leere Raeume werden entfernt. Gibt zurueck ob die Verbindung
    /// Mitglied war.
    pub fn leave(&self, room: &RoomId, conn: ConnectionId) -> bool {
        let mut raeume = self.raeume.lock();
        let Some(mitglieder) = raeume.get_mut(room) else {
            return false;
        };
        let entfernt = mitglieder.remove(&conn);
        if mitglieder.is_empty() {
            raeume.remove(room);
        }
        entfernt
    }

    /// Momentaufnahme der Mitglieder (leer fuer unbekannte Raeume)
    pub fn members(&self, room: &RoomId) -> HashSet<ConnectionId> {
        self.raeume.lock().get(room).cloned().unwrap_or_default()
    }

    pub fn is_member(&self, room: &RoomId, conn: ConnectionId) -> bool {
        self.raeume
            .lock()
            .get(room)
            .is_some_and(|mitglieder| mitglieder.contains(&conn))
    }

    /// Entfernt eine Verbindung aus allen Raeumen
    ///
    /// Gibt die Raeume zurueck, in denen sie Mitglied war.
    pub fn remove_everywhere(&self, conn: ConnectionId) -> Vec<RoomId> {
        let mut raeume = self.raeume.lock();
        let mut betroffen = Vec::new();
        raeume.retain(|room, mitglieder| {
            if mitglieder.remove(&conn) {
                betroffen.push(room.clone());
            }
            !mitglieder.is_empty()
        });
        betroffen
    }

    /// Anzahl der Raeume mit mindestens einem Mitglied
    pub fn room_count(&self) -> usize {
        self.raeume.lock().len()
    }

    /// Anzahl der Mitgliedschaften ueber alle Raeume
    pub fn connection_count(&self) -> usize {
        self.raeume.lock().values().map(HashSet::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_ist_idempotent() {
        let registry = RoomRegistry::neu();
        let raum = RoomId::new("r1");
        let conn = ConnectionId::new();

        assert!(registry.join(&raum, conn));
        assert!(!registry.join(&raum, conn));
        assert_eq!(registry.members(&raum).len(), 1);
        assert_eq!(registry.room_count(), 1);
    }

    #[test]
    fn leave_entfernt_leere_raeume() {
        let registry = RoomRegistry::neu();
        let raum = RoomId::new("r1");
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        registry.join(&raum, a);
        registry.join(&raum, b);

        assert!(registry.leave(&raum, a));
        assert_eq!(registry.room_count(), 1);
        assert!(!registry.is_member(&raum, a));
        assert!(registry.is_member(&raum, b));

        assert!(registry.leave(&raum, b));
        assert_eq!(registry.room_count(), 0);
    }

    #[test]
    fn leave_ohne_mitgliedschaft() {
        let registry = RoomRegistry::neu();
        let raum = RoomId::new("r1");
        assert!(!registry.leave(&raum, ConnectionId::new()));

        registry.join(&raum, ConnectionId::new());
        assert!(!registry.leave(&raum, ConnectionId::new()));
        assert_eq!(registry.room_count(), 1);
    }

    #[test]
    fn unbekannter_raum_ist_leer() {
        let registry = RoomRegistry::neu();
        let raum = RoomId::new("gibt-es-nicht");
        assert!(registry.members(&raum).is_empty());
        assert!(!registry.is_member(&raum, ConnectionId::new()));
    }

    #[test]
    fn remove_everywhere_ueber_mehrere_raeume() {
        let registry = RoomRegistry::neu();
        let r1 = RoomId::new("r1");
        let r2 = RoomId::new("r2");
        let r3 = RoomId::new("r3");
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        registry.join(&r1, a);
        registry.join(&r2, a);
        registry.join(&r2, b);
        registry.join(&r3, b);
        assert_eq!(registry.connection_count(), 4);

        let mut betroffen = registry.remove_everywhere(a);
        betroffen.sort_by(|x, y| x.as_str().cmp(y.as_str()));
        assert_eq!(betroffen, vec![r1.clone(), r2.clone()]);

        // r1 war nur mit a besetzt und ist jetzt weg
        assert_eq!(registry.room_count(), 2);
        assert!(registry.members(&r1).is_empty());
        assert_eq!(registry.members(&r2), HashSet::from([b]));
        assert_eq!(registry.connection_count(), 2);

        assert!(registry.remove_everywhere(a).is_empty());
    }

    #[test]
    fn nebenlaeufige_beitritte() {
        use std::sync::Arc;

        let registry = Arc::new(RoomRegistry::neu());
        let raum = RoomId::new("voll");

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let raum = raum.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        registry.join(&raum, ConnectionId::new());
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(registry.members(&raum).len(), 800);
    }
}
