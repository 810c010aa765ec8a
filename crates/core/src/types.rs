//! Gemeinsame Identifikationstypen und Grenzwerte fuer GameRelay
//!
//! IDs verwenden das Newtype-Pattern um Verwechslungen zur Compilezeit
//! auszuschliessen.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Grenzwerte
// ---------------------------------------------------------------------------

/// Maximale Anzahl Spieler pro Sitzung
pub const MAX_SPIELER: usize = 5;

/// Maximale Laenge eines Spielnamens in Zeichen
pub const MAX_SPIELNAME_LAENGE: usize = 32;

/// Maximale Laenge eines Benutzernamens in Zeichen
pub const MAX_USERNAME_LAENGE: usize = 26;

// ---------------------------------------------------------------------------
// ConnectionId
// ---------------------------------------------------------------------------

/// Opakes Handle einer Transport-Verbindung, eindeutig pro Link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Erstellt eine neue zufaellige ConnectionId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn:{}", self.0)
    }
}
