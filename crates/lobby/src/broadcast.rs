//! Event-Broadcaster – In-Memory-Transport fuer alle verbundenen Clients
//!
//! Der EventBroadcaster verwaltet die Send-Queues aller verbundenen Clients
//! und die Topic-Abonnements. Er implementiert [`Transport`], der
//! WebSocket-Task jeder Verbindung liest die zugehoerige Queue aus.
//!
//! ## Reihenfolge
//! Jede Verbindung hat genau eine FIFO-Queue. Nachrichten, die nacheinander
//! veroeffentlicht werden, kommen bei jedem Abonnenten in derselben
//! Reihenfolge an.

use dashmap::DashMap;
use gamerelay_core::ConnectionId;
use gamerelay_protocol::SchliessCode;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::transport::{Ausgehend, Transport};

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Standardgroesse der Send-Queue pro Client
pub const SEND_QUEUE_GROESSE: usize = 64;

// ---------------------------------------------------------------------------
// ClientSender
// ---------------------------------------------------------------------------

/// Handle auf die Send-Queue eines verbundenen Clients
#[derive(Clone, Debug)]
pub struct ClientSender {
    pub verbindung: ConnectionId,
    pub tx: mpsc::Sender<Ausgehend>,
}

impl ClientSender {
    /// Sendet eine Nachricht nicht-blockierend an den Client
    ///
    /// Gibt `false` zurueck wenn die Queue voll oder geschlossen ist.
    pub fn senden(&self, nachricht: Ausgehend) -> bool {
        match self.tx.try_send(nachricht) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(verbindung = %self.verbindung, "Send-Queue voll – Nachricht verworfen");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(verbindung = %self.verbindung, "Send-Queue geschlossen (Client getrennt)");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EventBroadcaster
// ---------------------------------------------------------------------------

/// Zentraler Broadcaster fuer alle verbundenen Clients
///
/// Thread-safe via Arc + DashMap. Clone teilt den inneren Zustand.
#[derive(Clone)]
pub struct EventBroadcaster {
    inner: Arc<EventBroadcasterInner>,
}

struct EventBroadcasterInner {
    /// Client-Sender, indiziert nach ConnectionId
    clients: DashMap<ConnectionId, ClientSender>,
    /// Topic-Abonnements: topic -> Abonnenten in Beitrittsreihenfolge
    topics: DashMap<String, Vec<ConnectionId>>,
    queue_groesse: usize,
}

impl EventBroadcaster {
    /// Erstellt einen neuen EventBroadcaster
    pub fn neu() -> Self {
        Self::mit_queue_groesse(SEND_QUEUE_GROESSE)
    }

    /// Erstellt einen EventBroadcaster mit eigener Queue-Groesse pro Client
    pub fn mit_queue_groesse(queue_groesse: usize) -> Self {
        Self {
            inner: Arc::new(EventBroadcasterInner {
                clients: DashMap::new(),
                topics: DashMap::new(),
                queue_groesse: queue_groesse.max(1),
            }),
        }
    }

    /// Registriert einen neuen Client und gibt seine Empfangs-Queue zurueck
    ///
    /// Der WebSocket-Task liest aus dieser Queue und sendet an den Socket.
    pub fn client_registrieren(&self, verbindung: ConnectionId) -> mpsc::Receiver<Ausgehend> {
        let (tx, rx) = mpsc::channel(self.inner.queue_groesse);
        let sender = ClientSender { verbindung, tx };
        self.inner.clients.insert(verbindung, sender);
        tracing::debug!(verbindung = %verbindung, "Client im Broadcaster registriert");
        rx
    }

    /// Entfernt einen Client samt aller Abonnements
    ///
    /// Bereits eingereihte Nachrichten bleiben in der Queue lesbar.
    pub fn client_entfernen(&self, verbindung: &ConnectionId) {
        if self.inner.clients.remove(verbindung).is_none() {
            return;
        }
        self.inner.topics.iter_mut().for_each(|mut entry| {
            entry.value_mut().retain(|id| id != verbindung);
        });
        self.inner.topics.retain(|_, abonnenten| !abonnenten.is_empty());
        tracing::debug!(verbindung = %verbindung, "Client aus Broadcaster entfernt");
    }

    /// Sendet eine Nachricht an einen einzelnen Client
    ///
    /// Gibt `true` zurueck wenn der Client gefunden und die Nachricht eingereiht wurde.
    pub fn an_client_senden(&self, verbindung: &ConnectionId, nachricht: Ausgehend) -> bool {
        match self.inner.clients.get(verbindung) {
            Some(sender) => sender.senden(nachricht),
            None => {
                tracing::debug!(verbindung = %verbindung, "Senden an unbekannten Client");
                false
            }
        }
    }

    /// Sendet eine Nachricht an alle Abonnenten eines Topics
    ///
    /// Gibt die Anzahl der erfolgreichen Sendungen zurueck.
    pub fn an_topic_senden(&self, topic: &str, nachricht: Ausgehend) -> usize {
        let abonnenten = match self.inner.topics.get(topic) {
            Some(ids) => ids.clone(),
            None => return 0,
        };

        let mut gesendet = 0;
        for verbindung in &abonnenten {
            if let Some(sender) = self.inner.clients.get(verbindung) {
                if sender.senden(nachricht.clone()) {
                    gesendet += 1;
                }
            }
        }
        gesendet
    }

    /// Prueft ob ein Client registriert ist
    pub fn ist_registriert(&self, verbindung: &ConnectionId) -> bool {
        self.inner.clients.contains_key(verbindung)
    }

    /// Gibt alle Abonnenten eines Topics zurueck
    pub fn abonnenten(&self, topic: &str) -> Vec<ConnectionId> {
        self.inner
            .topics
            .get(topic)
            .map(|ids| ids.clone())
            .unwrap_or_default()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::neu()
    }
}

impl Transport for EventBroadcaster {
    fn senden(&self, verbindung: ConnectionId, nachricht: String) {
        self.an_client_senden(&verbindung, Ausgehend::Text(nachricht));
    }

    fn veroeffentlichen(&self, topic: &str, nachricht: String) {
        let gesendet = self.an_topic_senden(topic, Ausgehend::Text(nachricht));
        tracing::trace!(topic = %topic, empfaenger = gesendet, "Topic-Nachricht verteilt");
    }

    fn abonnieren(&self, verbindung: ConnectionId, topic: &str) {
        let mut abonnenten = self.inner.topics.entry(topic.to_string()).or_default();
        if !abonnenten.contains(&verbindung) {
            abonnenten.push(verbindung);
        }
    }

    fn abbestellen(&self, verbindung: ConnectionId, topic: &str) {
        if let Some(mut abonnenten) = self.inner.topics.get_mut(topic) {
            abonnenten.retain(|id| id != &verbindung);
            let ist_leer = abonnenten.is_empty();
            drop(abonnenten);
            if ist_leer {
                self.inner.topics.remove_if(topic, |_, ids| ids.is_empty());
            }
        }
    }

    fn schliessen(&self, verbindung: ConnectionId, code: SchliessCode, grund: &str) {
        self.an_client_senden(
            &verbindung,
            Ausgehend::Schliessen {
                code,
                grund: grund.to_string(),
            },
        );
        // Sender fallen lassen: der Empfaenger liest noch die Queue leer und
        // sieht danach das Ende.
        self.client_entfernen(&verbindung);
    }

    fn ping(&self, verbindung: ConnectionId) {
        self.an_client_senden(&verbindung, Ausgehend::Ping);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
