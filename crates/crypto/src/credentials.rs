//! Raum-Zugangsdaten (Raum-ID, Raum-Schluessel, Nickname)
//!
//! Raum-ID und Schluessel werden lokal erzeugt und ausserhalb des Relays
//! geteilt. Das Relay sieht nur die Raum-ID, nie den Schluessel.

use flurfunk_core::RoomId;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;

/// Laenge einer generierten Raum-ID
pub const RAUM_ID_LAENGE: usize = 32;
/// Laenge eines generierten Raum-Schluessels
pub const RAUM_SCHLUESSEL_LAENGE: usize = 16;

const WOERTER: &[&str] = &[
    "amber", "birch", "cobalt", "delta", "ember", "falcon", "glacier", "harbor", "iris",
    "juniper", "kestrel", "lumen", "maple", "nebula", "onyx", "pebble", "quartz", "raven",
    "sierra", "tundra", "umber", "violet", "willow", "zephyr",
];

/// Zugangsdaten eines Teilnehmers fuer einen Raum
#[derive(Clone, PartialEq, Eq)]
pub struct RoomCredentials {
    pub room_id: RoomId,
    pub room_key: String,
    pub nickname: String,
}

impl RoomCredentials {
    /// Erstellt Zugangsdaten aus bekannten Werten (z.B. aus einem Einladungslink)
    pub fn new(
        room_id: impl Into<RoomId>,
        room_key: impl Into<String>,
        nickname: impl Into<String>,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            room_key: room_key.into(),
            nickname: nickname.into(),
        }
    }

    /// Erzeugt einen neuen Raum mit zufaelliger ID, Schluessel und Nickname
    pub fn generieren() -> Self {
        Self {
            room_id: RoomId::new(zufalls_string(RAUM_ID_LAENGE)),
            room_key: zufalls_string(RAUM_SCHLUESSEL_LAENGE),
            nickname: zufalls_nickname(),
        }
    }

    /// Tritt einem bestehenden Raum mit neuem Zufalls-Nickname bei
    pub fn beitreten(room_id: impl Into<RoomId>, room_key: impl Into<String>) -> Self {
        Self::new(room_id, room_key, zufalls_nickname())
    }
}

impl std::fmt::Debug for RoomCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomCredentials")
            .field("room_id", &self.room_id)
            .field("room_key", &"[REDACTED]")
            .field("nickname", &self.nickname)
            .finish()
    }
}

/// Alphanumerischer Zufalls-String aus dem OS-Zufallsgenerator
pub fn zufalls_string(laenge: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(laenge)
        .map(char::from)
        .collect()
}

/// Nickname der Form `wort_<0..9999>`
pub fn zufalls_nickname() -> String {
    let mut rng = OsRng;
    let wort = WOERTER.choose(&mut rng).copied().unwrap_or("gast");
    let nummer: u16 = rng.gen_range(0..10_000);
    format!("{wort}_{nummer}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generierte_werte_haben_richtige_form() {
        let c = RoomCredentials::generieren();
        assert_eq!(c.room_id.as_str().len(), RAUM_ID_LAENGE);
        assert_eq!(c.room_key.len(), RAUM_SCHLUESSEL_LAENGE);
        assert!(c.room_id.as_str().chars().all(|z| z.is_ascii_alphanumeric()));
        assert!(c.room_key.chars().all(|z| z.is_ascii_alphanumeric()));
    }

    #[test]
    fn nickname_format() {
        for _ in 0..50 {
            let nick = zufalls_nickname();
            let (wort, nummer) = nick.split_once('_').unwrap();
            assert!(WOERTER.contains(&wort));
            assert!(nummer.parse::<u16>().unwrap() < 10_000);
        }
    }

    #[test]
    fn zwei_raeume_sind_verschieden() {
        let a = RoomCredentials::generieren();
        let b = RoomCredentials::generieren();
        assert_ne!(a.room_id, b.room_id);
        assert_ne!(a.room_key, b.room_key);
    }

    #[test]
    fn debug_schwaerzt_schluessel() {
        let c = RoomCredentials::new("raum", "supergeheim", "ember_1");
        let text = format!("{c:?}");
        assert!(!text.contains("supergeheim"));
        assert!(text.contains("ember_1"));
    }
}
