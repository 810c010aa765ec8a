//! Integration-Test: Server mit Konfiguration starten, Lobby nutzen, beenden

use futures_util::{SinkExt, StreamExt};
use gamerelay_server::{config::ServerConfig, Server};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn server_bedient_konfigurierten_pfad_und_faehrt_herunter() {
    let config: ServerConfig = toml::from_str(
        r#"
        [netzwerk]
        ws_pfad = "/lobby"

        [lobby]
        max_spieler = 2
        "#,
    )
    .expect("Konfiguration ungueltig");

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let adresse = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(Server::neu(config).starten_mit_listener(listener, async move {
        let _ = stop_rx.await;
    }));

    let url = format!("ws://{adresse}/lobby");
    let (mut ws, _) = connect_async(url.as_str()).await.expect("Verbindung fehlgeschlagen");
    ws.send(Message::text("GAMEJOIN.tisch,alice")).await.unwrap();

    let antwort = timeout(TIMEOUT, ws.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(antwort, Message::text("GAMEJOIN_ACCEPT.alice"));

    // Kapazitaet aus der Konfiguration
    let (mut bob, _) = connect_async(format!("{url}?game=tisch&username=bob")).await.unwrap();
    let antwort = timeout(TIMEOUT, bob.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(antwort, Message::text("GAMEJOIN_ACCEPT.alice,bob"));
    let (mut carol, _) = connect_async(format!("{url}?game=tisch&username=carol")).await.unwrap();
    let antwort = timeout(TIMEOUT, carol.next()).await.unwrap().unwrap().unwrap();
    assert_eq!(antwort, Message::text("GAMEJOIN_DENY.GAME_FULL"));

    stop_tx.send(()).unwrap();
    timeout(TIMEOUT, server)
        .await
        .expect("Server hat nicht rechtzeitig beendet")
        .unwrap()
        .unwrap();
}
