//! Liveness-Monitor – Periodischer Sweep ueber alle Verbindungen
//!
//! Tickt alle `T` Sekunden und ruft
//! [`LobbyController::liveness_sweep`] auf. Der erste Tick kommt nach `T`,
//! nicht sofort beim Start.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

use crate::controller::LobbyController;
use crate::transport::Transport;

/// Hintergrund-Task fuer den Liveness-Sweep
pub struct LivenessMonitor<T: Transport + Clone> {
    controller: Arc<LobbyController<T>>,
}

impl<T: Transport + Clone> LivenessMonitor<T> {
    pub fn neu(controller: Arc<LobbyController<T>>) -> Self {
        Self { controller }
    }

    /// Laeuft bis `shutdown_rx` `true` meldet
    pub async fn starten(self, mut shutdown_rx: watch::Receiver<bool>) {
        let periode = self.controller.config().liveness_intervall();
        let jetzt = tokio::time::Instant::now();
        let erster_tick = jetzt.checked_add(periode).unwrap_or(jetzt);
        let mut intervall = tokio::time::interval_at(erster_tick, periode);
        intervall.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!(intervall_sek = periode.as_secs(), "Liveness-Monitor gestartet");

        loop {
            tokio::select! {
                _ = intervall.tick() => {
                    let ergebnis = self.controller.liveness_sweep(Instant::now());
                    tracing::debug!(
                        angepingt = ergebnis.angepingt,
                        entfernt = ergebnis.entfernt.len(),
                        "Liveness-Sweep"
                    );
                }

                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Liveness-Monitor gestoppt");
    }
}
