//! Gemeinsamer Lobby-Zustand
//!
//! Haelt Konfiguration, Broadcaster und Controller als Arc-Referenzen, die
//! sicher zwischen tokio-Tasks geteilt werden koennen.

use gamerelay_core::MAX_SPIELER;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::archive::SpielArchiv;
use crate::broadcast::EventBroadcaster;
use crate::controller::LobbyController;
use crate::registry::SessionRegistry;

/// Obergrenze fuer die Periode des Liveness-Sweeps (ein Tag)
pub const MAX_LIVENESS_INTERVALL_SEK: u64 = 86_400;

/// Konfiguration fuer den Lobby-Service
#[derive(Debug, Clone)]
pub struct LobbyConfig {
    /// Maximale Spieler pro Sitzung
    pub max_spieler: usize,
    /// Periode des Liveness-Sweeps in Sekunden
    pub liveness_intervall_sek: u64,
    /// Groesse der Send-Queue pro Verbindung
    pub send_queue_groesse: usize,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            max_spieler: MAX_SPIELER,
            liveness_intervall_sek: 60,
            send_queue_groesse: crate::broadcast::SEND_QUEUE_GROESSE,
        }
    }
}

impl LobbyConfig {
    /// Spieler pro Sitzung, nie mehr als [`MAX_SPIELER`]
    pub fn kapazitaet(&self) -> usize {
        self.max_spieler.min(MAX_SPIELER)
    }

    /// Periode `T` des Liveness-Sweeps, begrenzt auf
    /// `1..=MAX_LIVENESS_INTERVALL_SEK` Sekunden
    pub fn liveness_intervall(&self) -> Duration {
        Duration::from_secs(
            self.liveness_intervall_sek
                .clamp(1, MAX_LIVENESS_INTERVALL_SEK),
        )
    }

    /// Ohne Pong laenger als `2T` gilt eine Verbindung als tot
    pub fn timeout_grenze(&self) -> Duration {
        self.liveness_intervall()
            .checked_mul(2)
            .unwrap_or(Duration::MAX)
    }
}

/// Gemeinsamer Lobby-Zustand (thread-safe, Arc-geteilt)
pub struct LobbyState {
    pub config: Arc<LobbyConfig>,
    /// In-Memory-Transport (Send-Queues und Topics)
    pub broadcaster: EventBroadcaster,
    /// Lebenszyklus aller Verbindungen
    pub controller: Arc<LobbyController<EventBroadcaster>>,
    /// Startzeitpunkt (fuer Uptime-Berechnung)
    pub start_time: Instant,
}

impl LobbyState {
    /// Erstellt einen neuen LobbyState mit frischer Registry
    pub fn neu(config: LobbyConfig, archiv: Arc<dyn SpielArchiv>) -> Arc<Self> {
        let config = Arc::new(config);
        let broadcaster = EventBroadcaster::mit_queue_groesse(config.send_queue_groesse);
        let controller = Arc::new(LobbyController::neu(
            Arc::clone(&config),
            SessionRegistry::neu(),
            broadcaster.clone(),
            archiv,
        ));
        Arc::new(Self {
            config,
            broadcaster,
            controller,
            start_time: Instant::now(),
        })
    }

    /// Gibt die Uptime in Sekunden zurueck
    pub fn uptime_sek(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kapazitaet_bleibt_bei_max_spieler() {
        let config = LobbyConfig {
            max_spieler: 8,
            ..LobbyConfig::default()
        };
        assert_eq!(config.kapazitaet(), MAX_SPIELER);

        let config = LobbyConfig {
            max_spieler: 2,
            ..LobbyConfig::default()
        };
        assert_eq!(config.kapazitaet(), 2);
    }

    #[test]
    fn riesiges_intervall_wird_begrenzt() {
        let config = LobbyConfig {
            liveness_intervall_sek: u64::MAX,
            ..LobbyConfig::default()
        };
        assert_eq!(
            config.liveness_intervall(),
            Duration::from_secs(MAX_LIVENESS_INTERVALL_SEK)
        );
        assert_eq!(
            config.timeout_grenze(),
            Duration::from_secs(2 * MAX_LIVENESS_INTERVALL_SEK)
        );
    }

    #[test]
    fn intervall_null_wird_eine_sekunde() {
        let config = LobbyConfig {
            liveness_intervall_sek: 0,
            ..LobbyConfig::default()
        };
        assert_eq!(config.liveness_intervall(), Duration::from_secs(1));
        assert_eq!(config.timeout_grenze(), Duration::from_secs(2));
    }
}
