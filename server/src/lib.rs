//! flurfunk-server – Bibliotheks-Root
//!
//! Verdrahtet Relay und Observability-Server und stellt den
//! oeffentlichen Einstiegspunkt fuer Integrationstests bereit.

pub mod config;

use anyhow::Result;
use config::ServerConfig;
use flurfunk_observability::{observability_server_starten, FlurfunkMetrics, HealthState};
use flurfunk_relay::{RelayServer, RelayState};
use tokio::sync::watch;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Server-Subsysteme und laeuft bis Ctrl-C
    pub async fn starten(self) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let signal_tx = shutdown_tx.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Shutdown-Signal empfangen, Server wird beendet"),
                Err(e) => tracing::error!(fehler = %e, "Ctrl-C-Handler fehlgeschlagen"),
            }
            let _ = signal_tx.send(true);
        });

        self.starten_bis(shutdown_rx).await
    }

    /// Startet alle Server-Subsysteme und laeuft bis `shutdown_rx` `true` meldet
    ///
    /// Reihenfolge:
    /// 1. Metriken anlegen
    /// 2. Observability-Server starten (falls aktiviert)
    /// 3. WebSocket-Relay starten
    pub async fn starten_bis(self, shutdown_rx: watch::Receiver<bool>) -> Result<()> {
        self.config.pruefen()?;
        let ws_adresse = self.config.ws_bind_adresse()?;

        tracing::info!(
            server_name = %self.config.server.name,
            ws = %ws_adresse,
            max_verbindungen = self.config.server.max_verbindungen,
            max_envelope_bytes = self.config.relay.max_envelope_bytes,
            "Server startet"
        );

        let metriken = FlurfunkMetrics::neu()?;
        let health = HealthState::neu(metriken.clone(), self.config.server.max_verbindungen);

        let observability = if self.config.observability.aktiviert {
            let adresse = self.config.observability_bind_adresse()?;
            let task = tokio::spawn(observability_server_starten(
                adresse,
                metriken.clone(),
                health.clone(),
                shutdown_rx.clone(),
            ));
            Some(task)
        } else {
            tracing::info!("Observability-Server deaktiviert");
            None
        };

        let state = RelayState::neu(self.config.relay_config(), metriken);
        let relay = RelayServer::neu(state, ws_adresse);

        let mut bereit_rx = shutdown_rx.clone();
        let bereit = health.clone();
        tokio::spawn(async move {
            while bereit_rx.changed().await.is_ok() {
                if *bereit_rx.borrow() {
                    bereit.bereit_setzen(false);
                    break;
                }
            }
        });

        let ergebnis = relay.starten(shutdown_rx).await;

        if let Some(task) = observability {
            match task.await {
                Ok(Err(e)) => tracing::error!(fehler = %e, "Observability-Server fehlgeschlagen"),
                Err(e) => tracing::error!(fehler = %e, "Observability-Task abgebrochen"),
                Ok(Ok(())) => {}
            }
        }

        ergebnis?;
        tracing::info!("Server beendet");
        Ok(())
    }
}
