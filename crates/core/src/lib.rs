//! gamerelay-core – Gemeinsame Typen und Grenzwerte
//!
//! Dieses Crate stellt die Bausteine bereit, die Protokoll, Lobby und Server
//! gemeinsam nutzen.

pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use types::{
    ConnectionId, MAX_SPIELER, MAX_SPIELNAME_LAENGE, MAX_USERNAME_LAENGE,
};
