//! gamerelay-server – Bibliotheks-Root
//!
//! Verdrahtet Konfiguration, Lobby-Zustand, Liveness-Monitor und den
//! WebSocket-Endpunkt.

pub mod config;

use anyhow::Result;
use config::ServerConfig;
use gamerelay_lobby::{
    bedienen, router, KanalArchiv, LivenessMonitor, LobbyState, LogArchiv, WsState,
    ARCHIV_QUEUE_GROESSE,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Wie lange beim Beenden auf ausstehende Archiv-Protokolle gewartet wird
const ARCHIV_NACHLAUF: Duration = Duration::from_secs(2);

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Server-Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Lobby-Zustand aufbauen
    /// 2. Liveness-Monitor starten
    /// 3. WebSocket-Listener binden und bedienen
    /// 4. Auf Ctrl-C warten, dann alle Tasks beenden
    pub async fn starten(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_adresse()).await?;
        self.starten_mit_listener(listener, shutdown_signal()).await
    }

    /// Wie [`Server::starten`], aber mit vorgegebenem Listener und
    /// Shutdown-Future
    pub async fn starten_mit_listener<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let (archiv, archiv_task) = KanalArchiv::starten(Arc::new(LogArchiv), ARCHIV_QUEUE_GROESSE);
        let lobby = LobbyState::neu(self.config.lobby_config(), Arc::new(archiv));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tracing::info!(
            adresse = %listener.local_addr()?,
            pfad = %self.config.netzwerk.ws_pfad,
            max_spieler = lobby.config.max_spieler,
            liveness_intervall_sek = lobby.config.liveness_intervall_sek,
            "Server startet"
        );

        let monitor = LivenessMonitor::neu(Arc::clone(&lobby.controller));
        let monitor_task = tokio::spawn(monitor.starten(shutdown_rx.clone()));

        let app = router(
            WsState {
                lobby: Arc::clone(&lobby),
                shutdown_rx: shutdown_rx.clone(),
            },
            &self.config.netzwerk.ws_pfad,
        );

        // Shutdown an Monitor und offene Verbindungen weiterreichen
        let mut server_rx = shutdown_rx;
        let signal_task = tokio::spawn(async move {
            shutdown.await;
            tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
            let _ = shutdown_tx.send(true);
        });
        let server_shutdown = async move {
            while server_rx.changed().await.is_ok() {
                if *server_rx.borrow() {
                    break;
                }
            }
        };

        bedienen(listener, app, server_shutdown).await?;

        signal_task.abort();
        let _ = monitor_task.await;

        let sitzungen = lobby.controller.registry().schnappschuss();
        tracing::info!(
            uptime_sek = lobby.uptime_sek(),
            sitzungen = sitzungen.len(),
            laufende_spiele = sitzungen.iter().filter(|s| s.gestartet).count(),
            "Server beendet"
        );

        // Der Controller haelt das KanalArchiv; danach laeuft die Queue leer
        drop(lobby);
        if tokio::time::timeout(ARCHIV_NACHLAUF, archiv_task).await.is_err() {
            tracing::warn!("Archiv-Queue beim Beenden nicht leer geworden");
        }
        Ok(())
    }
}

/// Wartet auf Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(fehler = %e, "Ctrl-C-Handler konnte nicht installiert werden");
        std::future::pending::<()>().await;
    }
}
