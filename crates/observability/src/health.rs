//! Health-Check-Endpunkt fuer Flurfunk
//!
//! Endpoint: `GET /health`
//! Response: JSON mit Status, Version, Uptime, Raum- und Verbindungsanzahl

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::metrics::FlurfunkMetrics;

/// Status des Health-Checks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Antwort des Health-Check-Endpunkts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub rooms: i64,
    pub connections: i64,
}

/// Geteilter Zustand fuer den Health-Check-Handler
#[derive(Clone)]
pub struct HealthState {
    pub start_time: Arc<Instant>,
    /// false sobald der Relay-Server herunterfaehrt
    pub bereit: Arc<AtomicBool>,
    /// Ab dieser Verbindungsanzahl meldet der Check `degraded`
    pub max_verbindungen: i64,
    metriken: FlurfunkMetrics,
}

impl HealthState {
    pub fn neu(metriken: FlurfunkMetrics, max_verbindungen: usize) -> Self {
        Self {
            start_time: Arc::new(Instant::now()),
            bereit: Arc::new(AtomicBool::new(true)),
            max_verbindungen: max_verbindungen as i64,
            metriken,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn ist_bereit(&self) -> bool {
        self.bereit.load(Ordering::Relaxed)
    }

    pub fn bereit_setzen(&self, bereit: bool) {
        self.bereit.store(bereit, Ordering::Relaxed);
    }

    /// Ermittelt den aktuellen Status aus Bereitschaft und Auslastung
    pub fn status(&self) -> HealthStatus {
        if !self.ist_bereit() {
            HealthStatus::Unhealthy
        } else if self.metriken.connected_clients.get() >= self.max_verbindungen {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }

    pub fn antwort(&self) -> HealthResponse {
        HealthResponse {
            status: self.status(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.uptime_seconds(),
            rooms: self.metriken.rooms_active.get(),
            connections: self.metriken.connected_clients.get(),
        }
    }
}

/// Axum-Router fuer den `/health`-Endpunkt
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

/// `GET /health` – gibt den Serverstatus zurueck
async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let response = state.antwort();

    let http_status = match response.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded => StatusCode::OK, // 200 auch bei degraded (Probe soll nicht failen)
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (http_status, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> HealthState {
        HealthState::neu(FlurfunkMetrics::neu().unwrap(), 10)
    }

    #[test]
    fn health_state_uptime_frisch() {
        let state = test_state();
        assert!(state.uptime_seconds() < 5);
    }

    #[test]
    fn status_folgt_bereitschaft_und_last() {
        let state = test_state();
        assert_eq!(state.status(), HealthStatus::Healthy);

        state.metriken.connected_clients.set(10);
        assert_eq!(state.status(), HealthStatus::Degraded);

        state.bereit_setzen(false);
        assert_eq!(state.status(), HealthStatus::Unhealthy);
    }

    #[test]
    fn antwort_liest_metriken() {
        let state = test_state();
        state.metriken.rooms_active.set(3);
        state.metriken.connected_clients.set(5);

        let antwort = state.antwort();
        assert_eq!(antwort.rooms, 3);
        assert_eq!(antwort.connections, 5);
        assert_eq!(antwort.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn health_response_serialisierung() {
        let response = HealthResponse {
            status: HealthStatus::Healthy,
            version: "0.1.0".to_string(),
            uptime_seconds: 3600,
            rooms: 2,
            connections: 4,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(json.contains("\"uptime_seconds\":3600"));
        assert!(json.contains("\"rooms\":2"));
        assert!(json.contains("\"connections\":4"));
    }

    #[tokio::test]
    async fn handler_meldet_503_beim_herunterfahren() {
        let state = test_state();
        state.bereit_setzen(false);

        let antwort = health_handler(State(state)).await.into_response();
        assert_eq!(antwort.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = axum::body::to_bytes(antwort.into_body(), usize::MAX)
            .await
            .unwrap();
        let parsed: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.status, HealthStatus::Unhealthy);
    }
}
