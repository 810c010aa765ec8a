//! Fehlertypen fuer den Lobby-Service
//!
//! Kein Fehler hier ist fatal: der Controller bildet jede Variante entweder
//! auf eine `*_DENY`-Antwort ab oder verwirft die Nachricht.

use gamerelay_core::ConnectionId;
use gamerelay_protocol::{AktionVerweigert, BeitrittVerweigert, ProtokollFehler};
use thiserror::Error;

/// Fehlertyp fuer den Lobby-Service
#[derive(Debug, Error)]
pub enum LobbyError {
    /// Nachricht konnte nicht dekodiert werden
    #[error("Protokollfehler: {0}")]
    Protokoll(#[from] ProtokollFehler),

    /// Beitritt abgelehnt (Validierung)
    #[error("Beitritt abgelehnt: {0}")]
    BeitrittAbgelehnt(BeitrittVerweigert),

    /// Spielaktion abgelehnt
    #[error("Aktion abgelehnt: {0}")]
    AktionAbgelehnt(AktionVerweigert),

    /// Ereignis ist im aktuellen Verbindungszustand nicht erlaubt
    #[error("{ereignis} im Zustand {zustand:?} nicht erlaubt")]
    UngueltigerZustand {
        ereignis: &'static str,
        zustand: crate::controller::VerbindungsZustand,
    },

    /// Server-seitiges Ereignis vom Client empfangen
    #[error("Unerwartetes Ereignis vom Client: {0}")]
    UnerwartetesEreignis(&'static str),

    /// Verbindung ist dem Controller nicht (mehr) bekannt
    #[error("Unbekannte Verbindung: {0}")]
    UnbekannteVerbindung(ConnectionId),

    /// IO-Fehler (Listener, Socket)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

impl From<BeitrittVerweigert> for LobbyError {
    fn from(grund: BeitrittVerweigert) -> Self {
        Self::BeitrittAbgelehnt(grund)
    }
}

impl From<AktionVerweigert> for LobbyError {
    fn from(grund: AktionVerweigert) -> Self {
        Self::AktionAbgelehnt(grund)
    }
}

/// Result-Typ fuer den Lobby-Service
pub type LobbyResult<T> = Result<T, LobbyError>;
