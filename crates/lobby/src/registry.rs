//! Session-Registry – Welche Sitzungen existieren, wer ist Mitglied
//!
//! Die Registry haelt den ephemeren Zustand aller aktiven Sitzungen,
//! indiziert nach Sitzungsname. Der Name ist der einzige Schluessel;
//! `gestartet` ist ein Feld der Sitzung.
//!
//! ## Sperren
//! Alle schreibenden Operationen laufen ueber [`RegistryZugriff`], der die
//! Registry exklusiv sperrt. Der Controller haelt die Sperre ueber
//! Pruefung, Mutation und Broadcast hinweg, sodass niemand eine halb
//! aktualisierte Sitzung sieht. Lesende Abfragen liefern Schnappschuesse.
//!
//! Die Registry validiert nicht: Namens- und Kapazitaetspruefungen macht
//! ausschliesslich der Controller.

use gamerelay_core::ConnectionId;
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Mitglied / Session
// ---------------------------------------------------------------------------

/// Ein Mitglied einer Sitzung
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mitglied {
    pub username: String,
    pub verbindung: ConnectionId,
}

/// Eine aktive Lobby- bzw. Spielsitzung
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub name: String,
    /// Mitglieder in Beitrittsreihenfolge; das erste ist der Besitzer
    pub mitglieder: Vec<Mitglied>,
    pub gestartet: bool,
}

impl Session {
    fn neu(name: &str, erstes_mitglied: Mitglied) -> Self {
        Self {
            name: name.to_string(),
            mitglieder: vec![erstes_mitglied],
            gestartet: false,
        }
    }

    /// Verbindung des Besitzers (erstes Mitglied)
    pub fn besitzer(&self) -> Option<ConnectionId> {
        self.mitglieder.first().map(|m| m.verbindung)
    }

    /// Benutzernamen aller Mitglieder in Beitrittsreihenfolge
    pub fn spielernamen(&self) -> Vec<String> {
        self.mitglieder.iter().map(|m| m.username.clone()).collect()
    }

    pub fn hat_username(&self, username: &str) -> bool {
        self.mitglieder.iter().any(|m| m.username == username)
    }

    pub fn anzahl(&self) -> usize {
        self.mitglieder.len()
    }
}

// ---------------------------------------------------------------------------
// SessionRegistry
// ---------------------------------------------------------------------------

/// Prozessweite Zuordnung Sitzungsname -> Session
///
/// Clone teilt den inneren Zustand. Jede mit [`SessionRegistry::neu`]
/// erstellte Registry ist unabhaengig.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<Mutex<HashMap<String, Session>>>,
}

impl SessionRegistry {
    /// Erstellt eine neue, leere Registry
    pub fn neu() -> Self {
        Self::default()
    }

    /// Sperrt die Registry exklusiv fuer schreibende Operationen
    pub fn sperren(&self) -> RegistryZugriff<'_> {
        RegistryZugriff {
            sitzungen: self.inner.lock(),
        }
    }

    /// Schnappschuss einer Sitzung (ohne Seiteneffekt)
    pub fn finden(&self, name: &str) -> Option<Session> {
        self.inner.lock().get(name).cloned()
    }

    /// Schnappschuss aller Sitzungen
    pub fn schnappschuss(&self) -> Vec<Session> {
        self.inner.lock().values().cloned().collect()
    }

    /// Anzahl aktiver Sitzungen
    pub fn anzahl(&self) -> usize {
        self.inner.lock().len()
    }
}

// ---------------------------------------------------------------------------
// RegistryZugriff
// ---------------------------------------------------------------------------

/// Exklusiver Zugriff auf die Registry
///
/// Die Sperre wird beim Drop freigegeben.
pub struct RegistryZugriff<'a> {
    sitzungen: MutexGuard<'a, HashMap<String, Session>>,
}

impl RegistryZugriff<'_> {
    pub fn finden(&self, name: &str) -> Option<&Session> {
        self.sitzungen.get(name)
    }

    /// Legt die Sitzung mit einem Mitglied an oder haengt das Mitglied an
    pub fn erstellen_oder_beitreten(
        &mut self,
        name: &str,
        username: &str,
        verbindung: ConnectionId,
    ) -> &Session {
        let mitglied = Mitglied {
            username: username.to_string(),
            verbindung,
        };
        self.sitzungen
            .entry(name.to_string())
            .and_modify(|s| s.mitglieder.push(mitglied.clone()))
            .or_insert_with(|| {
                tracing::debug!(spiel = %name, "Sitzung angelegt");
                Session::neu(name, mitglied)
            })
    }

    /// Entfernt das Mitglied mit dieser Verbindung
    ///
    /// Gibt den Zustand der Sitzung nach dem Entfernen zurueck. Ist die
    /// Sitzung danach leer, wird sie im selben Schritt aus der Registry
    /// geloescht. `None` wenn Sitzung oder Mitglied nicht existieren.
    pub fn mitglied_entfernen(&mut self, name: &str, verbindung: ConnectionId) -> Option<Session> {
        let sitzung = self.sitzungen.get_mut(name)?;
        let position = sitzung
            .mitglieder
            .iter()
            .position(|m| m.verbindung == verbindung)?;
        sitzung.mitglieder.remove(position);

        if sitzung.mitglieder.is_empty() {
            tracing::debug!(spiel = %name, "Letztes Mitglied weg – Sitzung entfernt");
            return self.sitzungen.remove(name);
        }
        Some(sitzung.clone())
    }

    /// Markiert die Sitzung als gestartet (idempotent)
    ///
    /// Gibt `true` zurueck wenn der Zustand sich dadurch geaendert hat.
    pub fn als_gestartet_markieren(&mut self, name: &str) -> bool {
        match self.sitzungen.get_mut(name) {
            Some(sitzung) if !sitzung.gestartet => {
                sitzung.gestartet = true;
                true
            }
            _ => false,
        }
    }

    /// Entfernt eine Sitzung vollstaendig
    pub fn aufloesen(&mut self, name: &str) -> Option<Session> {
        self.sitzungen.remove(name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
