//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use anyhow::Context;
use flurfunk_observability::{log_format_gueltig, log_level_gueltig};
use flurfunk_relay::RelayConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Relay-Einstellungen (Envelope-Grenze, Send-Queues)
    pub relay: RelayEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Observability-Einstellungen (Metriken, Health)
    pub observability: ObservabilityEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers (nur fuer Logs)
    pub name: String,
    /// Maximale Anzahl gleichzeitiger WebSocket-Verbindungen
    pub max_verbindungen: usize,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Flurfunk Relay".into(),
            max_verbindungen: 1024,
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer WebSocket und Observability
    pub bind_adresse: String,
    /// Port fuer den WebSocket-Endpunkt (`/ws`)
    pub ws_port: u16,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            ws_port: 38883,
        }
    }
}

/// Relay-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayEinstellungen {
    /// Obergrenze fuer einen einzelnen Envelope in Bytes
    pub max_envelope_bytes: usize,
    /// Send-Queue pro Verbindung (volle Queue = Nachricht wird verworfen)
    pub sende_queue_groesse: usize,
}

impl Default for RelayEinstellungen {
    fn default() -> Self {
        let relay = RelayConfig::default();
        Self {
            max_envelope_bytes: relay.max_envelope_bytes,
            sende_queue_groesse: relay.sende_queue_groesse,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Observability-Einstellungen (Metriken + Health-Check)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityEinstellungen {
    /// Aktiviert den Observability-Server
    pub aktiviert: bool,
    /// Port fuer Metriken und Health (Standard: 9300)
    pub port: u16,
}

impl Default for ObservabilityEinstellungen {
    fn default() -> Self {
        Self {
            aktiviert: true,
            port: 9300,
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                config.pruefen()?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Prueft Werte, die serde nicht abfangen kann
    pub fn pruefen(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.relay.max_envelope_bytes > 0,
            "relay.max_envelope_bytes muss groesser als 0 sein"
        );
        anyhow::ensure!(
            self.relay.sende_queue_groesse > 0,
            "relay.sende_queue_groesse muss groesser als 0 sein"
        );
        anyhow::ensure!(
            self.server.max_verbindungen > 0,
            "server.max_verbindungen muss groesser als 0 sein"
        );
        anyhow::ensure!(
            log_level_gueltig(&self.logging.level),
            "logging.level '{}' ist ungueltig (trace, debug, info, warn, error)",
            self.logging.level
        );
        anyhow::ensure!(
            log_format_gueltig(&self.logging.format),
            "logging.format '{}' ist ungueltig (text, json)",
            self.logging.format
        );
        self.ws_bind_adresse()?;
        Ok(())
    }

    /// Gibt die Bind-Adresse fuer den WebSocket-Endpunkt zurueck
    pub fn ws_bind_adresse(&self) -> anyhow::Result<SocketAddr> {
        let adresse = format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.ws_port);
        adresse
            .parse()
            .with_context(|| format!("Ungueltige WebSocket-Adresse '{adresse}'"))
    }

    /// Gibt die Bind-Adresse fuer den Observability-Server zurueck
    pub fn observability_bind_adresse(&self) -> anyhow::Result<SocketAddr> {
        let adresse = format!("{}:{}", self.netzwerk.bind_adresse, self.observability.port);
        adresse
            .parse()
            .with_context(|| format!("Ungueltige Observability-Adresse '{adresse}'"))
    }

    /// Leitet die Relay-Konfiguration ab
    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            max_verbindungen: self.server.max_verbindungen,
            max_envelope_bytes: self.relay.max_envelope_bytes,
            sende_queue_groesse: self.relay.sende_queue_groesse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_config_ist_valide() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.server.max_verbindungen, 1024);
        assert_eq!(cfg.netzwerk.ws_port, 38883);
        assert_eq!(cfg.relay.max_envelope_bytes, 12 * 1024 * 1024);
        assert_eq!(cfg.relay.sende_queue_groesse, 64);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.logging.format, "text");
        assert!(cfg.observability.aktiviert);
        assert_eq!(cfg.observability.port, 9300);
        cfg.pruefen().unwrap();
    }

    #[test]
    fn bind_adressen() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.ws_bind_adresse().unwrap().to_string(), "0.0.0.0:38883");
        assert_eq!(
            cfg.observability_bind_adresse().unwrap().to_string(),
            "0.0.0.0:9300"
        );
    }

    #[test]
    fn config_aus_toml_string() {
        let toml = r#"
            [server]
            name = "Etage 3"
            max_verbindungen = 100

            [relay]
            max_envelope_bytes = 2048

            [logging]
            format = "json"
        "#;
        let cfg: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.server.name, "Etage 3");
        assert_eq!(cfg.server.max_verbindungen, 100);
        assert_eq!(cfg.relay.max_envelope_bytes, 2048);
        assert_eq!(cfg.logging.format, "json");
        // Nicht angegebene Felder behalten Standardwerte
        assert_eq!(cfg.relay.sende_queue_groesse, 64);
        assert_eq!(cfg.netzwerk.ws_port, 38883);
        assert_eq!(cfg.logging.level, "info");

        let relay = cfg.relay_config();
        assert_eq!(relay.max_verbindungen, 100);
        assert_eq!(relay.max_envelope_bytes, 2048);
    }

    #[test]
    fn ungueltige_werte_werden_abgelehnt() {
        let mut cfg = ServerConfig::default();
        cfg.relay.sende_queue_groesse = 0;
        assert!(cfg.pruefen().is_err());

        let mut cfg = ServerConfig::default();
        cfg.netzwerk.bind_adresse = "kein host".into();
        assert!(cfg.pruefen().is_err());
    }

    #[test]
    fn logging_werte_werden_geprueft() {
        let mut cfg = ServerConfig::default();
        cfg.logging.format = "xml".into();
        let fehler = cfg.pruefen().unwrap_err().to_string();
        assert!(fehler.contains("logging.format"));

        let mut cfg = ServerConfig::default();
        cfg.logging.level = "verbose".into();
        let fehler = cfg.pruefen().unwrap_err().to_string();
        assert!(fehler.contains("logging.level"));

        let mut cfg = ServerConfig::default();
        cfg.logging.level = "debug".into();
        cfg.logging.format = "json".into();
        cfg.pruefen().unwrap();
    }

    #[test]
    fn laden_lehnt_ungueltiges_log_format_ab() {
        let dir = tempfile::tempdir().unwrap();
        let pfad = dir.path().join("config.toml");
        std::fs::write(&pfad, "[logging]\nformat = \"yaml\"\n").unwrap();
        assert!(ServerConfig::laden(pfad.to_str().unwrap()).is_err());
    }

    #[test]
    fn laden_fehlende_datei_ergibt_standard() {
        let cfg = ServerConfig::laden("/gibt/es/nicht/config.toml").unwrap();
        assert_eq!(cfg.netzwerk.ws_port, 38883);
    }

    #[test]
    fn laden_aus_datei() {
        let dir = tempfile::tempdir().unwrap();
        let pfad = dir.path().join("config.toml");
        std::fs::write(&pfad, "[netzwerk]\nws_port = 4000\n").unwrap();

        let cfg = ServerConfig::laden(pfad.to_str().unwrap()).unwrap();
        assert_eq!(cfg.netzwerk.ws_port, 4000);

        std::fs::write(&pfad, "[netzwerk]\nws_port = \"abc\"\n").unwrap();
        assert!(ServerConfig::laden(pfad.to_str().unwrap()).is_err());
    }
}
