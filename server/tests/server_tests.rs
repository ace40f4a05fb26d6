//! Start/Stop des kompletten Servers

use flurfunk_server::{config::ServerConfig, Server};
use std::time::Duration;
use tokio::sync::watch;

fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.netzwerk.bind_adresse = "127.0.0.1".into();
    config.netzwerk.ws_port = 0;
    config.observability.port = 0;
    config
}

#[tokio::test]
async fn server_beendet_sich_nach_shutdown_signal() {
    let (tx, rx) = watch::channel(false);
    let task = tokio::spawn(Server::neu(test_config()).starten_bis(rx));

    tokio::time::sleep(Duration::from_millis(100)).await;
    tx.send(true).unwrap();

    let ergebnis = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("Server hat sich nicht beendet")
        .unwrap();
    assert!(ergebnis.is_ok());
}

#[tokio::test]
async fn ungueltige_config_verhindert_start() {
    let mut config = test_config();
    config.relay.max_envelope_bytes = 0;
    let (_tx, rx) = watch::channel(false);
    assert!(Server::neu(config).starten_bis(rx).await.is_err());
}
