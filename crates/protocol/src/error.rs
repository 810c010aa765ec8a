//! Fehlertypen fuer das Dekodieren eingehender Nachrichten
//!
//! Protokollfehler sind nie fatal: der Aufrufer verwirft die Nachricht
//! stillschweigend und bestraft die Verbindung nicht.

use thiserror::Error;

/// Fehler beim Dekodieren einer Nachricht
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtokollFehler {
    /// Nachricht ohne Ereignis-Token (leer oder beginnt mit `.`)
    #[error("Kein Ereignis-Token")]
    KeinEreignis,

    /// Ereignis-Token ausserhalb der bekannten Menge
    #[error("Unbekanntes Ereignis: {0}")]
    UnbekanntesEreignis(String),

    /// Nutzlast passt nicht zum Schema des Ereignisses
    #[error("Ungueltige Nutzlast fuer {ereignis}: {grund}")]
    UngueltigeNutzlast {
        ereignis: &'static str,
        grund: String,
    },
}

impl ProtokollFehler {
    /// Erstellt einen Nutzlast-Fehler
    pub fn nutzlast(ereignis: &'static str, grund: impl Into<String>) -> Self {
        Self::UngueltigeNutzlast {
            ereignis,
            grund: grund.into(),
        }
    }
}

/// Result-Typ fuer das Protokoll
pub type ProtokollResult<T> = Result<T, ProtokollFehler>;
