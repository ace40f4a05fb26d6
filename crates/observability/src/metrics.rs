//! Prometheus-kompatible Metriken fuer Flurfunk
//!
//! Registrierte Metriken:
//! - `flurfunk_connected_clients` – Gauge: Aktuell verbundene WebSocket-Clients
//! - `flurfunk_rooms_active` – Gauge: Raeume mit mindestens einem Mitglied
//! - `flurfunk_envelopes_relayed_total` – Counter: Weitergeleitete Nachrichten
//! - `flurfunk_notices_total` – Counter: Erzeugte Beitritts-/Verlassen-Hinweise
//! - `flurfunk_envelopes_rejected_total` – Counter: Abgelehnte Envelopes (reason)
//! - `flurfunk_deliveries_dropped_total` – Counter: Verworfene Zustellungen (Queue voll/zu)
//! - `flurfunk_http_requests_total` – Counter: HTTP-Anfragen (method, path, status)
//! - `flurfunk_http_request_duration_seconds` – Histogram: HTTP-Antwortzeit

use anyhow::Result;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Alle Flurfunk-Prometheus-Metriken
///
/// Clone teilt Registry und Metriken. Jede Instanz hat ihre eigene
/// Registry, mehrere Relays in einem Prozess kollidieren daher nicht.
#[derive(Clone)]
pub struct FlurfunkMetrics {
    pub registry: Arc<Registry>,

    // Relay-Metriken
    pub connected_clients: IntGauge,
    pub rooms_active: IntGauge,
    pub envelopes_relayed_total: IntCounter,
    pub notices_total: IntCounter,
    pub envelopes_rejected_total: IntCounterVec,
    pub deliveries_dropped_total: IntCounter,

    // HTTP-Metriken
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
}

impl FlurfunkMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        // --- Relay-Metriken ---
        let connected_clients = IntGauge::with_opts(Opts::new(
            "flurfunk_connected_clients",
            "Anzahl aktuell verbundener Clients",
        ))?;
        registry.register(Box::new(connected_clients.clone()))?;

        let rooms_active = IntGauge::with_opts(Opts::new(
            "flurfunk_rooms_active",
            "Anzahl aktiver Raeume",
        ))?;
        registry.register(Box::new(rooms_active.clone()))?;

        let envelopes_relayed_total = IntCounter::with_opts(Opts::new(
            "flurfunk_envelopes_relayed_total",
            "Gesamtanzahl weitergeleiteter Nachrichten",
        ))?;
        registry.register(Box::new(envelopes_relayed_total.clone()))?;

        let notices_total = IntCounter::with_opts(Opts::new(
            "flurfunk_notices_total",
            "Gesamtanzahl erzeugter Raum-Hinweise",
        ))?;
        registry.register(Box::new(notices_total.clone()))?;

        let envelopes_rejected_total = IntCounterVec::new(
            Opts::new(
                "flurfunk_envelopes_rejected_total",
                "Abgelehnte Envelopes nach Grund",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(envelopes_rejected_total.clone()))?;

        let deliveries_dropped_total = IntCounter::with_opts(Opts::new(
            "flurfunk_deliveries_dropped_total",
            "Verworfene Zustellungen (Send-Queue voll oder geschlossen)",
        ))?;
        registry.register(Box::new(deliveries_dropped_total.clone()))?;

        // --- HTTP-Metriken ---
        let http_requests_total = IntCounterVec::new(
            Opts::new("flurfunk_http_requests_total", "Gesamtanzahl HTTP-Anfragen"),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "flurfunk_http_request_duration_seconds",
                "HTTP-Antwortzeit in Sekunden",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
            ]),
            &["method", "path"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        // Prozess-Metriken (CPU, RSS, offene FDs) gibt es nur unter Linux
        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self {
            registry: Arc::new(registry),
            connected_clients,
            rooms_active,
            envelopes_relayed_total,
            notices_total,
            envelopes_rejected_total,
            deliveries_dropped_total,
            http_requests_total,
            http_request_duration_seconds,
        })
    }

    /// Zaehlt einen abgelehnten Envelope
    pub fn abgelehnt(&self, grund: &str) {
        self.envelopes_rejected_total.with_label_values(&[grund]).inc();
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: FlurfunkMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

pub(crate) async fn metrics_handler(State(metriken): State<FlurfunkMetrics>) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4",
            )],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
