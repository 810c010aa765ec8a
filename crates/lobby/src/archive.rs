//! Spiel-Archiv – Optionaler Haken beim Spielende
//!
//! Wird genau einmal pro abgebauter, gestarteter Sitzung aufgerufen,
//! nachdem der In-Memory-Abbau abgeschlossen ist. Fehler bleiben beim
//! Archiv und beeinflussen den Abbau nicht.
//!
//! Der Aufruf laeuft im Task der ausloesenden Verbindung. Langsame
//! Archive werden mit [`KanalArchiv`] entkoppelt.

use chrono::{DateTime, Utc};
use gamerelay_protocol::EndGrund;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Standardgroesse der Warteschlange von [`KanalArchiv`]
pub const ARCHIV_QUEUE_GROESSE: usize = 256;

/// Was ueber ein beendetes Spiel bekannt ist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpielProtokoll {
    pub spiel: String,
    /// Spieler unmittelbar vor dem Abbau, inklusive des ausloesenden
    pub spieler: Vec<String>,
    pub grund: EndGrund,
    pub beendet_am: DateTime<Utc>,
}

/// Empfaenger fuer Spielende-Ereignisse
pub trait SpielArchiv: Send + Sync + 'static {
    /// Darf nicht blockieren; die Verbindung wartet bis zur Rueckkehr
    fn spiel_beendet(&self, protokoll: SpielProtokoll);
}

/// Verwirft alle Protokolle
#[derive(Debug, Clone, Copy, Default)]
pub struct KeinArchiv;

impl SpielArchiv for KeinArchiv {
    fn spiel_beendet(&self, _protokoll: SpielProtokoll) {}
}

/// Schreibt jedes Spielende als strukturiertes Log-Ereignis
#[derive(Debug, Clone, Copy, Default)]
pub struct LogArchiv;

impl SpielArchiv for LogArchiv {
    fn spiel_beendet(&self, protokoll: SpielProtokoll) {
        tracing::info!(
            spiel = %protokoll.spiel,
            spieler = %protokoll.spieler.join(","),
            grund = %protokoll.grund,
            beendet_am = %protokoll.beendet_am.to_rfc3339(),
            "Spiel archiviert"
        );
    }
}

// ---------------------------------------------------------------------------
// KanalArchiv
// ---------------------------------------------------------------------------

/// Reicht Protokolle ueber eine begrenzte Queue an ein Ziel-Archiv weiter
///
/// `spiel_beendet` reiht nur ein (try_send). Ein eigener Task ruft das Ziel
/// ueber `spawn_blocking` auf. Bei voller Queue wird das Protokoll verworfen.
pub struct KanalArchiv {
    tx: mpsc::Sender<SpielProtokoll>,
}

impl KanalArchiv {
    /// Startet den Weiterleitungs-Task; muss innerhalb einer tokio-Runtime
    /// aufgerufen werden
    ///
    /// Der Task endet, sobald das `KanalArchiv` fallen gelassen und die
    /// Queue leer gelesen ist.
    pub fn starten(ziel: Arc<dyn SpielArchiv>, groesse: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<SpielProtokoll>(groesse);
        let task = tokio::spawn(async move {
            while let Some(protokoll) = rx.recv().await {
                let ziel = Arc::clone(&ziel);
                let spiel = protokoll.spiel.clone();
                let ergebnis =
                    tokio::task::spawn_blocking(move || ziel.spiel_beendet(protokoll)).await;
                if let Err(e) = ergebnis {
                    tracing::warn!(spiel = %spiel, fehler = %e, "Archivierung fehlgeschlagen");
                }
            }
            tracing::debug!("Archiv-Queue geschlossen");
        });
        (Self { tx }, task)
    }
}

impl SpielArchiv for KanalArchiv {
    fn spiel_beendet(&self, protokoll: SpielProtokoll) {
        if let Err(e) = self.tx.try_send(protokoll) {
            let protokoll = match e {
                mpsc::error::TrySendError::Full(p) | mpsc::error::TrySendError::Closed(p) => p,
            };
            tracing::warn!(
                spiel = %protokoll.spiel,
                "Archiv-Queue voll oder geschlossen, Protokoll verworfen"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::{Duration, Instant};

    /// Braucht fuer jedes Protokoll eine Weile
    #[derive(Default)]
    struct LangsamesArchiv {
        protokolle: Mutex<Vec<SpielProtokoll>>,
    }

    impl SpielArchiv for LangsamesArchiv {
        fn spiel_beendet(&self, protokoll: SpielProtokoll) {
            std::thread::sleep(Duration::from_millis(300));
            self.protokolle.lock().push(protokoll);
        }
    }

    fn protokoll(spiel: &str) -> SpielProtokoll {
        SpielProtokoll {
            spiel: spiel.into(),
            spieler: vec!["alice".into(), "bob".into()],
            grund: EndGrund::SpielerVerlassen,
            beendet_am: Utc::now(),
        }
    }

    #[tokio::test]
    async fn kanal_archiv_blockiert_den_aufrufer_nicht() {
        let ziel = Arc::new(LangsamesArchiv::default());
        let (archiv, task) =
            KanalArchiv::starten(Arc::clone(&ziel) as Arc<dyn SpielArchiv>, ARCHIV_QUEUE_GROESSE);

        let start = Instant::now();
        archiv.spiel_beendet(protokoll("runde1"));
        archiv.spiel_beendet(protokoll("runde2"));
        assert!(start.elapsed() < Duration::from_millis(100));

        // Queue schliessen und abarbeiten lassen
        drop(archiv);
        task.await.unwrap();

        let spiele: Vec<_> = ziel.protokolle.lock().iter().map(|p| p.spiel.clone()).collect();
        assert_eq!(spiele, vec!["runde1", "runde2"]);
    }

    #[tokio::test]
    async fn volle_queue_verwirft_protokoll() {
        let ziel = Arc::new(LangsamesArchiv::default());
        let (archiv, task) = KanalArchiv::starten(Arc::clone(&ziel) as Arc<dyn SpielArchiv>, 1);

        // Der Task laeuft erst beim naechsten await; die Queue fasst eins
        archiv.spiel_beendet(protokoll("behalten"));
        archiv.spiel_beendet(protokoll("verworfen"));

        drop(archiv);
        task.await.unwrap();

        let spiele: Vec<_> = ziel.protokolle.lock().iter().map(|p| p.spiel.clone()).collect();
        assert_eq!(spiele, vec!["behalten"]);
    }
}
