//! WebSocket-Endpunkt – Axum-Router und Verbindungs-Schleife
//!
//! `GET <pfad>?game=<name>&username=<name>` wird auf WebSocket
//! hochgestuft. Sind `game` oder `username` gesetzt, tritt die Verbindung
//! beim Oeffnen implizit bei.
//!
//! Pro Verbindung laeuft ein Task, der eingehende Frames an den
//! [`LobbyController`](crate::controller::LobbyController) weiterreicht und
//! die Send-Queue des [`EventBroadcaster`] auf den Socket schreibt.

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use gamerelay_core::ConnectionId;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use crate::controller::BeitrittsParameter;
use crate::error::LobbyResult;
use crate::server_state::LobbyState;
use crate::transport::Ausgehend;

/// Close-Code beim Herunterfahren (Going Away)
const CLOSE_GOING_AWAY: u16 = 1001;

/// Query-Parameter beim Verbindungsaufbau
#[derive(Debug, Default, Deserialize)]
pub struct BeitrittsQuery {
    pub game: Option<String>,
    pub username: Option<String>,
}

impl From<BeitrittsQuery> for BeitrittsParameter {
    fn from(query: BeitrittsQuery) -> Self {
        Self {
            spiel: query.game,
            username: query.username,
        }
    }
}

/// Zustand der Axum-Handler
#[derive(Clone)]
pub struct WsState {
    pub lobby: Arc<LobbyState>,
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Erstellt den Router mit dem WebSocket-Endpunkt unter `pfad`
pub fn router(state: WsState, pfad: &str) -> Router {
    Router::new()
        .route(pfad, get(ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bedient den Router auf dem Listener bis `shutdown` fertig ist
pub async fn bedienen<F>(listener: TcpListener, router: Router, shutdown: F) -> LobbyResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let adresse = listener.local_addr()?;
    tracing::info!(adresse = %adresse, "WebSocket-Server gestartet");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!("WebSocket-Server gestoppt");
    Ok(())
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    Query(query): Query<BeitrittsQuery>,
    State(state): State<WsState>,
) -> Response {
    ws.on_upgrade(move |socket| verbindung_verarbeiten(socket, state, query.into()))
}

/// Verbindungs-Schleife bis Close, Fehler oder Shutdown
async fn verbindung_verarbeiten(
    mut socket: WebSocket,
    state: WsState,
    parameter: BeitrittsParameter,
) {
    let id = ConnectionId::new();
    let broadcaster = state.lobby.broadcaster.clone();
    let controller = Arc::clone(&state.lobby.controller);
    let mut shutdown_rx = state.shutdown_rx;

    // Queue zuerst registrieren, damit die Beitrittsantwort nicht verloren geht
    let mut sende_rx = broadcaster.client_registrieren(id);
    controller.bei_oeffnung(id, parameter);

    loop {
        tokio::select! {
            // Eingehender Frame vom Client
            eingehend = socket.recv() => {
                match eingehend {
                    Some(Ok(Message::Text(text))) => controller.bei_nachricht(id, &text),
                    Some(Ok(Message::Pong(_))) => controller.bei_pong(id),
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Binary(_))) => {}
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(verbindung = %id, "Verbindung vom Client getrennt");
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::warn!(verbindung = %id, fehler = %e, "WebSocket-Lesefehler");
                        break;
                    }
                }
            }

            // Ausgehende Nachricht aus dem Broadcaster
            ausgehend = sende_rx.recv() => {
                let Some(ausgehend) = ausgehend else {
                    // Queue entfernt und leer gelesen
                    break;
                };
                let (nachricht, letzte) = match ausgehend {
                    Ausgehend::Text(text) => (Message::Text(text), false),
                    Ausgehend::Ping => (Message::Ping(Vec::new()), false),
                    Ausgehend::Schliessen { code, grund } => (
                        Message::Close(Some(CloseFrame {
                            code: code.code(),
                            reason: grund.into(),
                        })),
                        true,
                    ),
                };
                if let Err(e) = socket.send(nachricht).await {
                    tracing::warn!(verbindung = %id, fehler = %e, "Senden fehlgeschlagen");
                    break;
                }
                if letzte {
                    break;
                }
            }

            // Shutdown-Signal
            Ok(()) = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    tracing::debug!(verbindung = %id, "Shutdown-Signal – Verbindung wird getrennt");
                    let _ = socket
                        .send(Message::Close(Some(CloseFrame {
                            code: CLOSE_GOING_AWAY,
                            reason: "server shutdown".into(),
                        })))
                        .await;
                    break;
                }
            }
        }
    }

    // Cleanup: Controller zuerst, dann die Queue
    controller.bei_schliessung(id);
    broadcaster.client_entfernen(&id);
    tracing::debug!(verbindung = %id, "Verbindungs-Task beendet");
}
