//! gamerelay-lobby – Lobby- und Spielsitzungen ueber WebSocket
//!
//! Dieser Crate implementiert den Relay-Kern von GameRelay: Clients treten
//! benannten Lobbys bei, der Besitzer startet das Spiel, danach werden
//! Aktionen und Nachrichten an alle Mitglieder weitergereicht. Faellt ein
//! Spieler aus einem laufenden Spiel, wird die Sitzung fuer alle beendet.
//!
//! ## Architektur
//!
//! ```text
//! Axum WebSocket-Endpunkt (ws)
//!     |
//!     v
//! LobbyController (Lebenszyklus pro Verbindung)
//!     |  State Machine: Verbindend -> Beigetreten -> ImSpiel -> Geschlossen
//!     |
//!     +-- SessionRegistry  (Sitzungsname -> Mitglieder, gestartet)
//!     +-- BroadcastRelay   (Ereignis -> Topic der Sitzung)
//!     +-- SpielArchiv      (Haken beim Spielende)
//!
//! EventBroadcaster – Send-Queues und Topics, implementiert Transport
//! LivenessMonitor  – Periodischer Ping und Timeout-Sweep
//! ```

pub mod archive;
pub mod broadcast;
pub mod controller;
pub mod error;
pub mod liveness;
pub mod registry;
pub mod relay;
pub mod server_state;
pub mod transport;
pub mod ws;

// Bequeme Re-Exporte
pub use archive::{
    KanalArchiv, KeinArchiv, LogArchiv, SpielArchiv, SpielProtokoll, ARCHIV_QUEUE_GROESSE,
};
pub use broadcast::EventBroadcaster;
pub use controller::{BeitrittsParameter, LobbyController, SweepErgebnis, VerbindungsZustand};
pub use error::{LobbyError, LobbyResult};
pub use liveness::LivenessMonitor;
pub use registry::{Session, SessionRegistry};
pub use relay::BroadcastRelay;
pub use server_state::{LobbyConfig, LobbyState, MAX_LIVENESS_INTERVALL_SEK};
pub use transport::{Ausgehend, Transport};
pub use ws::{bedienen, router, WsState};
