//! Broadcast-Relay – Verteilt kodierte Ereignisse an eine Sitzung
//!
//! Zustellung ist best-effort und fire-and-forget. Innerhalb einer Sitzung
//! kommen Nachrichten in der Reihenfolge an, in der der Controller sie
//! veroeffentlicht.

use gamerelay_protocol::Ereignis;

use crate::transport::Transport;

/// Veroeffentlicht Ereignisse auf dem Topic einer Sitzung
#[derive(Clone)]
pub struct BroadcastRelay<T: Transport> {
    transport: T,
}

impl<T: Transport> BroadcastRelay<T> {
    pub fn neu(transport: T) -> Self {
        Self { transport }
    }

    /// Kodiert das Ereignis und verteilt es an alle Abonnenten der Sitzung,
    /// den Absender eingeschlossen
    pub fn veroeffentlichen(&self, sitzung: &str, ereignis: &Ereignis) {
        tracing::trace!(spiel = %sitzung, ereignis = ereignis.typ(), "Relay");
        self.transport.veroeffentlichen(sitzung, ereignis.kodieren());
    }
}
