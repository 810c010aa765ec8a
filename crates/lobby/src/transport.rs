//! Transport-Schnittstelle – Ausgehende Operationen des Lobby-Kerns
//!
//! Der Kern ruft nur diese Operationen auf. Alle Aufrufe sind
//! fire-and-forget: sie blockieren nicht und liefern kein Ergebnis, das der
//! Kern abwarten muesste. Gegendruck ist Sache der Implementierung.

use gamerelay_core::ConnectionId;
use gamerelay_protocol::SchliessCode;

/// Ausgehende Nachricht an eine einzelne Verbindung
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ausgehend {
    /// Kodierte Protokollnachricht (`EVENT.payload`)
    Text(String),
    /// Liveness-Probe
    Ping,
    /// Verbindung mit Code und Grund schliessen
    Schliessen { code: SchliessCode, grund: String },
}

/// Ausgehende Transport-Operationen
pub trait Transport: Send + Sync + 'static {
    /// Unicast an eine Verbindung
    fn senden(&self, verbindung: ConnectionId, nachricht: String);

    /// Multicast an alle Abonnenten eines Topics
    fn veroeffentlichen(&self, topic: &str, nachricht: String);

    /// Verbindung abonniert ein Topic
    fn abonnieren(&self, verbindung: ConnectionId, topic: &str);

    /// Verbindung bestellt ein Topic ab
    fn abbestellen(&self, verbindung: ConnectionId, topic: &str);

    /// Schliesst die Verbindung mit Code und Grund
    fn schliessen(&self, verbindung: ConnectionId, code: SchliessCode, grund: &str);

    /// Sendet eine Liveness-Probe
    fn ping(&self, verbindung: ConnectionId);
}
