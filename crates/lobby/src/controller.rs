//! Lobby-Controller – Lebenszyklus jeder Verbindung
//!
//! Der Controller empfaengt die Ereignisse der Transportschicht
//! (`bei_oeffnung`, `bei_nachricht`, `bei_pong`, `bei_schliessung`),
//! dekodiert Nachrichten, prueft Beitritte und fuehrt Registry- und
//! Broadcast-Seiteneffekte aus.
//!
//! ## State Machine
//! ```text
//! Verbindend --GAMEJOIN ok--> Beigetreten --GAMEACTION (Besitzer, >=2)--> ImSpiel
//!     |                           |                                         |
//!     | Ablehnung (beim Oeffnen)  +------ GAMELEAVE / Close / Timeout ------+
//!     v                           v
//! Geschlossen <-------------------+
//! ```
//!
//! ## Sperren
//! Jede Mutation laeuft unter der Registry-Sperre, inklusive der Broadcasts
//! die sie ausloest. Dadurch entspricht die Zustellreihenfolge pro Sitzung
//! der Mutationsreihenfolge. Die Verbindungstabelle wird nur kurz und nie
//! vor der Registry-Sperre gesperrt.

use dashmap::DashMap;
use gamerelay_core::{ConnectionId, MAX_SPIELNAME_LAENGE, MAX_USERNAME_LAENGE};
use gamerelay_protocol::codec::{FELD_TRENNER, GAMEACTION, GAMEJOIN, GAMEMSG};
use gamerelay_protocol::{
    dekodieren, AktionVerweigert, BeitrittVerweigert, EndGrund, Ereignis, SchliessCode,
};
use std::sync::Arc;
use std::time::Instant;

use crate::archive::{SpielArchiv, SpielProtokoll};
use crate::error::{LobbyError, LobbyResult};
use crate::registry::SessionRegistry;
use crate::relay::BroadcastRelay;
use crate::server_state::LobbyConfig;
use crate::transport::Transport;

// ---------------------------------------------------------------------------
// Verbindungszustand
// ---------------------------------------------------------------------------

/// Zustand einer Verbindung aus Sicht des Controllers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbindungsZustand {
    /// Verbunden, noch keiner Sitzung beigetreten
    Verbindend,
    /// Mitglied einer Lobby, Spiel noch nicht gestartet
    Beigetreten,
    /// Mitglied einer gestarteten Sitzung
    ImSpiel,
    /// Dem Controller nicht (mehr) bekannt
    Geschlossen,
}

/// Beitrittsparameter, die beim Verbindungsaufbau mitgegeben werden
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeitrittsParameter {
    pub spiel: Option<String>,
    pub username: Option<String>,
}

/// Ergebnis eines Liveness-Sweeps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepErgebnis {
    /// Wegen Timeout entfernte Verbindungen
    pub entfernt: Vec<ConnectionId>,
    /// Anzahl versendeter Liveness-Proben
    pub angepingt: usize,
}

#[derive(Debug, Clone)]
struct Verbindung {
    /// Name der Sitzung (keine Referenz auf die Sitzung selbst)
    sitzung: Option<String>,
    username: Option<String>,
    letzter_pong: Instant,
}

impl Verbindung {
    fn neu() -> Self {
        Self {
            sitzung: None,
            username: None,
            letzter_pong: Instant::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validierung
// ---------------------------------------------------------------------------

/// Spielname: nicht leer, hoechstens 32 Zeichen
pub fn spielname_pruefen(spiel: &str) -> Result<(), BeitrittVerweigert> {
    let laenge = spiel.chars().count();
    if laenge == 0 || laenge > MAX_SPIELNAME_LAENGE {
        return Err(BeitrittVerweigert::SpielnameUngueltig);
    }
    Ok(())
}

/// Benutzername: nicht leer, hoechstens 26 Zeichen, kein Listentrenner
pub fn username_pruefen(username: &str) -> Result<(), BeitrittVerweigert> {
    let laenge = username.chars().count();
    if laenge == 0 || laenge > MAX_USERNAME_LAENGE || username.contains(FELD_TRENNER) {
        return Err(BeitrittVerweigert::UsernameUngueltig);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// LobbyController
// ---------------------------------------------------------------------------

/// Treibt alle Verbindungen durch ihren Lebenszyklus
pub struct LobbyController<T: Transport + Clone> {
    config: Arc<LobbyConfig>,
    registry: SessionRegistry,
    transport: T,
    relay: BroadcastRelay<T>,
    archiv: Arc<dyn SpielArchiv>,
    verbindungen: DashMap<ConnectionId, Verbindung>,
}

impl<T: Transport + Clone> LobbyController<T> {
    /// Erstellt einen neuen Controller
    pub fn neu(
        config: Arc<LobbyConfig>,
        registry: SessionRegistry,
        transport: T,
        archiv: Arc<dyn SpielArchiv>,
    ) -> Self {
        Self {
            config,
            registry,
            relay: BroadcastRelay::neu(transport.clone()),
            transport,
            archiv,
            verbindungen: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &LobbyConfig {
        &self.config
    }

    /// Anzahl der bekannten (nicht geschlossenen) Verbindungen
    pub fn verbindungs_anzahl(&self) -> usize {
        self.verbindungen.len()
    }

    /// Aktueller Zustand einer Verbindung
    pub fn zustand(&self, verbindung: &ConnectionId) -> VerbindungsZustand {
        let sitzung = match self.verbindungen.get(verbindung) {
            Some(v) => v.sitzung.clone(),
            None => return VerbindungsZustand::Geschlossen,
        };
        match sitzung.and_then(|name| self.registry.finden(&name)) {
            Some(s) if s.gestartet => VerbindungsZustand::ImSpiel,
            Some(_) => VerbindungsZustand::Beigetreten,
            None => VerbindungsZustand::Verbindend,
        }
    }

    // -----------------------------------------------------------------------
    // Eingehende Transport-Ereignisse
    // -----------------------------------------------------------------------

    /// Neue Verbindung; optionale Parameter loesen einen impliziten Beitritt aus
    ///
    /// Ein abgelehnter impliziter Beitritt schliesst die Verbindung mit dem
    /// Code des Ablehnungsgrundes.
    pub fn bei_oeffnung(&self, id: ConnectionId, parameter: BeitrittsParameter) {
        self.verbindungen.insert(id, Verbindung::neu());
        tracing::info!(verbindung = %id, "Verbindung geoeffnet");

        if parameter.spiel.is_none() && parameter.username.is_none() {
            return;
        }
        let spiel = parameter.spiel.unwrap_or_default();
        let username = parameter.username.unwrap_or_default();

        match self.beitreten(id, &spiel, &username) {
            Ok(()) => {}
            Err(LobbyError::BeitrittAbgelehnt(grund)) => {
                tracing::debug!(verbindung = %id, spiel = %spiel, grund = %grund, "Beitritt beim Oeffnen abgelehnt");
                self.transport
                    .senden(id, Ereignis::BeitrittVerweigert(grund).kodieren());
                self.verbindungen.remove(&id);
                self.transport
                    .schliessen(id, grund.schliess_code(), grund.als_str());
            }
            Err(e) => {
                tracing::debug!(verbindung = %id, fehler = %e, "Beitritt beim Oeffnen verworfen");
            }
        }
    }

    /// Eingehende Rohnachricht
    ///
    /// Protokollfehler und Nachrichten im falschen Zustand werden
    /// stillschweigend verworfen.
    pub fn bei_nachricht(&self, id: ConnectionId, roh: &str) {
        match self.nachricht_verarbeiten(id, roh) {
            Ok(()) => {}
            Err(LobbyError::BeitrittAbgelehnt(grund)) => {
                tracing::debug!(verbindung = %id, grund = %grund, "Beitritt abgelehnt");
                self.transport
                    .senden(id, Ereignis::BeitrittVerweigert(grund).kodieren());
            }
            Err(LobbyError::AktionAbgelehnt(grund)) => {
                tracing::debug!(verbindung = %id, grund = %grund, "Aktion abgelehnt");
                self.transport
                    .senden(id, Ereignis::AktionVerweigert(grund).kodieren());
            }
            Err(e) => {
                tracing::debug!(verbindung = %id, fehler = %e, "Nachricht verworfen");
            }
        }
    }

    /// Antwort auf eine Liveness-Probe
    pub fn bei_pong(&self, id: ConnectionId) {
        if let Some(mut verbindung) = self.verbindungen.get_mut(&id) {
            verbindung.letzter_pong = Instant::now();
        }
    }

    /// Transport hat die Verbindung geschlossen
    pub fn bei_schliessung(&self, id: ConnectionId) {
        if self.verlassen(id, EndGrund::SpielerVerlassen, |_| true) {
            tracing::info!(verbindung = %id, "Verbindung geschlossen");
        }
    }

    // -----------------------------------------------------------------------
    // Liveness
    // -----------------------------------------------------------------------

    /// Ein Durchlauf ueber alle Verbindungen
    ///
    /// Verbindungen ohne Pong seit mehr als `2T` werden ueber denselben Pfad
    /// wie ein `GAMELEAVE` entfernt (Grund `PLAYER_TIMEOUT`) und geschlossen.
    /// Alle anderen bekommen eine Liveness-Probe.
    pub fn liveness_sweep(&self, jetzt: Instant) -> SweepErgebnis {
        let grenze = self.config.timeout_grenze();
        let ist_tot =
            |v: &Verbindung| jetzt.saturating_duration_since(v.letzter_pong) > grenze;

        // Schnappschuss, danach einzeln unter Sperre anwenden
        let schnappschuss: Vec<(ConnectionId, bool)> = self
            .verbindungen
            .iter()
            .map(|e| (*e.key(), ist_tot(e.value())))
            .collect();

        let mut ergebnis = SweepErgebnis::default();
        for (id, tot) in schnappschuss {
            if !tot {
                // Kann inzwischen mit seiner Sitzung abgebaut worden sein
                if !self.verbindungen.contains_key(&id) {
                    continue;
                }
                self.transport.ping(id);
                ergebnis.angepingt += 1;
                continue;
            }
            // Erneut pruefen: ein Pong kann seit dem Schnappschuss eingetroffen sein
            if self.verlassen(id, EndGrund::SpielerTimeout, ist_tot) {
                tracing::warn!(verbindung = %id, "Liveness-Timeout – Verbindung entfernt");
                self.transport.schliessen(
                    id,
                    SchliessCode::SpielerEntfernt,
                    EndGrund::SpielerTimeout.als_str(),
                );
                ergebnis.entfernt.push(id);
            }
        }
        ergebnis
    }

    // -----------------------------------------------------------------------
    // Nachrichtenverarbeitung
    // -----------------------------------------------------------------------

    fn nachricht_verarbeiten(&self, id: ConnectionId, roh: &str) -> LobbyResult<()> {
        let ereignis = dekodieren(roh)?;
        let zustand = self.zustand(&id);
        tracing::trace!(verbindung = %id, ereignis = ereignis.typ(), ?zustand, "Nachricht empfangen");

        use VerbindungsZustand::*;
        match (ereignis, zustand) {
            (_, Geschlossen) => Err(LobbyError::UnbekannteVerbindung(id)),
            (Ereignis::SpielBeitritt { spiel, username }, Verbindend) => {
                self.beitreten(id, &spiel, &username)
            }
            (Ereignis::SpielVerlassen(_), Beigetreten | ImSpiel) => {
                if self.verlassen(id, EndGrund::SpielerVerlassen, |_| true) {
                    self.transport
                        .schliessen(id, SchliessCode::Normal, "GAMELEAVE");
                }
                Ok(())
            }
            (Ereignis::SpielAktion(nutzlast), Beigetreten | ImSpiel) => self.aktion(id, nutzlast),
            (Ereignis::SpielNachricht(text), Beigetreten | ImSpiel) => {
                self.nachricht_weiterleiten(id, text)
            }
            (
                e @ (Ereignis::SpielBeitritt { .. }
                | Ereignis::SpielVerlassen(_)
                | Ereignis::SpielAktion(_)
                | Ereignis::SpielNachricht(_)),
                zustand,
            ) => Err(LobbyError::UngueltigerZustand {
                ereignis: e.typ(),
                zustand,
            }),
            (andere, _) => Err(LobbyError::UnerwartetesEreignis(andere.typ())),
        }
    }

    /// Prueft und fuehrt einen Beitritt aus
    ///
    /// Reihenfolge der Pruefungen: Spielname, Benutzername, Eindeutigkeit,
    /// Kapazitaet. Die erste fehlgeschlagene gewinnt.
    fn beitreten(&self, id: ConnectionId, spiel: &str, username: &str) -> LobbyResult<()> {
        spielname_pruefen(spiel)?;
        username_pruefen(username)?;

        let mut registry = self.registry.sperren();
        if let Some(sitzung) = registry.finden(spiel) {
            if sitzung.hat_username(username) {
                return Err(BeitrittVerweigert::UsernameVergeben.into());
            }
            if sitzung.anzahl() >= self.config.kapazitaet() {
                return Err(BeitrittVerweigert::SpielVoll.into());
            }
        }

        {
            let mut verbindung = self
                .verbindungen
                .get_mut(&id)
                .ok_or(LobbyError::UnbekannteVerbindung(id))?;
            if verbindung.sitzung.is_some() {
                return Err(LobbyError::UngueltigerZustand {
                    ereignis: GAMEJOIN,
                    zustand: VerbindungsZustand::Beigetreten,
                });
            }
            verbindung.sitzung = Some(spiel.to_string());
            verbindung.username = Some(username.to_string());
        }

        let spieler = registry
            .erstellen_oder_beitreten(spiel, username, id)
            .spielernamen();
        self.transport.abonnieren(id, spiel);

        tracing::info!(
            verbindung = %id,
            spiel = %spiel,
            username = %username,
            spieler = spieler.len(),
            "Spieler beigetreten"
        );
        self.relay.veroeffentlichen(spiel, &Ereignis::BeitrittAkzeptiert(spieler));
        Ok(())
    }

    /// `GAMEACTION`: startet das Spiel (Besitzer, mindestens zwei Spieler)
    /// oder leitet im laufenden Spiel weiter
    fn aktion(&self, id: ConnectionId, nutzlast: String) -> LobbyResult<()> {
        let mut registry = self.registry.sperren();
        let spiel = self.sitzung_von(&id).ok_or(LobbyError::UngueltigerZustand {
            ereignis: GAMEACTION,
            zustand: VerbindungsZustand::Verbindend,
        })?;
        let (gestartet, besitzer, anzahl) = match registry.finden(&spiel) {
            Some(s) => (s.gestartet, s.besitzer(), s.anzahl()),
            None => return Err(LobbyError::UnbekannteVerbindung(id)),
        };

        if !gestartet {
            if besitzer != Some(id) || anzahl < 2 {
                return Err(AktionVerweigert::SpielNichtGestartet.into());
            }
            registry.als_gestartet_markieren(&spiel);
            tracing::info!(spiel = %spiel, spieler = anzahl, "Spiel gestartet");
        }

        self.relay.veroeffentlichen(&spiel, &Ereignis::SpielAktion(nutzlast));
        Ok(())
    }

    /// `GAMEMSG`: Freitext an die ganze Sitzung
    fn nachricht_weiterleiten(&self, id: ConnectionId, text: String) -> LobbyResult<()> {
        let _registry = self.registry.sperren();
        let spiel = self.sitzung_von(&id).ok_or(LobbyError::UngueltigerZustand {
            ereignis: GAMEMSG,
            zustand: VerbindungsZustand::Verbindend,
        })?;
        self.relay.veroeffentlichen(&spiel, &Ereignis::SpielNachricht(text));
        Ok(())
    }

    /// Gemeinsamer Pfad fuer GAMELEAVE, Transport-Close und Timeout
    ///
    /// Entfernt die Verbindung, wenn `bedingung` unter der Sperre noch
    /// zutrifft. Verlaesst sie ein laufendes Spiel, wird die Sitzung fuer
    /// alle beendet. Gibt `true` zurueck wenn die Verbindung entfernt wurde.
    fn verlassen(
        &self,
        id: ConnectionId,
        grund: EndGrund,
        bedingung: impl FnOnce(&Verbindung) -> bool,
    ) -> bool {
        let mut registry = self.registry.sperren();
        let Some((_, verbindung)) = self.verbindungen.remove_if(&id, |_, v| bedingung(v)) else {
            return false;
        };
        let Some(spiel) = verbindung.sitzung else {
            return true;
        };
        let username = verbindung.username.unwrap_or_default();

        self.transport.abbestellen(id, &spiel);
        let Some(nachher) = registry.mitglied_entfernen(&spiel, id) else {
            return true;
        };
        tracing::info!(
            verbindung = %id,
            spiel = %spiel,
            username = %username,
            grund = %grund,
            "Spieler hat Sitzung verlassen"
        );

        if !nachher.mitglieder.is_empty() {
            self.relay
                .veroeffentlichen(&spiel, &Ereignis::SpielVerlassen(nachher.spielernamen()));
        }
        if !nachher.gestartet {
            return true;
        }

        // Ein laufendes Spiel kann ohne den Spieler nicht weiterlaufen
        if !nachher.mitglieder.is_empty() {
            self.relay.veroeffentlichen(&spiel, &Ereignis::SpielEnde(grund));
        }
        registry.aufloesen(&spiel);
        for mitglied in &nachher.mitglieder {
            self.transport.abbestellen(mitglied.verbindung, &spiel);
            self.verbindungen.remove(&mitglied.verbindung);
            self.transport.schliessen(
                mitglied.verbindung,
                SchliessCode::SpielerEntfernt,
                grund.als_str(),
            );
        }
        drop(registry);

        let mut spieler = nachher.spielernamen();
        spieler.push(username);
        tracing::info!(spiel = %spiel, grund = %grund, "Spiel beendet – Sitzung abgebaut");
        self.archiv.spiel_beendet(SpielProtokoll {
            spiel,
            spieler,
            grund,
            beendet_am: chrono::Utc::now(),
        });
        true
    }

    fn sitzung_von(&self, id: &ConnectionId) -> Option<String> {
        self.verbindungen.get(id)?.sitzung.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::KeinArchiv;
    use crate::broadcast::EventBroadcaster;
    use crate::transport::Ausgehend;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn controller() -> (LobbyController<EventBroadcaster>, EventBroadcaster) {
        let broadcaster = EventBroadcaster::neu();
        let controller = LobbyController::neu(
            Arc::new(LobbyConfig::default()),
            SessionRegistry::neu(),
            broadcaster.clone(),
            Arc::new(KeinArchiv),
        );
        (controller, broadcaster)
    }

    fn oeffnen(
        controller: &LobbyController<EventBroadcaster>,
        broadcaster: &EventBroadcaster,
    ) -> (ConnectionId, mpsc::Receiver<Ausgehend>) {
        let id = ConnectionId::new();
        let rx = broadcaster.client_registrieren(id);
        controller.bei_oeffnung(id, BeitrittsParameter::default());
        (id, rx)
    }

    fn alle(rx: &mut mpsc::Receiver<Ausgehend>) -> Vec<Ausgehend> {
        let mut v = Vec::new();
        while let Ok(a) = rx.try_recv() {
            v.push(a);
        }
        v
    }

    fn text(s: &str) -> Ausgehend {
        Ausgehend::Text(s.to_string())
    }

    #[test]
    fn validierung_grenzen() {
        assert!(spielname_pruefen(&"x".repeat(32)).is_ok());
        assert_eq!(
            spielname_pruefen(&"x".repeat(33)),
            Err(BeitrittVerweigert::SpielnameUngueltig)
        );
        assert!(spielname_pruefen("").is_err());
        assert!(username_pruefen(&"u".repeat(26)).is_ok());
        assert!(username_pruefen(&"u".repeat(27)).is_err());
        assert!(username_pruefen("").is_err());
        assert!(username_pruefen("a,b").is_err());
        // Zeichen, nicht Bytes
        assert!(username_pruefen(&"ü".repeat(26)).is_ok());
    }

    #[tokio::test]
    async fn beitritt_sendet_spielerliste_an_alle() {
        let (c, b) = controller();
        let (a, mut rx_a) = oeffnen(&c, &b);
        let (bob, mut rx_b) = oeffnen(&c, &b);

        c.bei_nachricht(a, "GAMEJOIN.lobby1,alice");
        c.bei_nachricht(bob, "GAMEJOIN.lobby1,bob");

        assert_eq!(
            alle(&mut rx_a),
            vec![text("GAMEJOIN_ACCEPT.alice"), text("GAMEJOIN_ACCEPT.alice,bob")]
        );
        assert_eq!(alle(&mut rx_b), vec![text("GAMEJOIN_ACCEPT.alice,bob")]);
        assert_eq!(c.zustand(&a), VerbindungsZustand::Beigetreten);
    }

    #[tokio::test]
    async fn pruefreihenfolge_erster_fehler_gewinnt() {
        let (c, b) = controller();
        let (a, _rx_a) = oeffnen(&c, &b);
        c.bei_nachricht(a, "GAMEJOIN.lobby1,alice");

        let (x, mut rx_x) = oeffnen(&c, &b);
        // ungueltiger Spielname schlaegt vor ungueltigem Username an
        c.bei_nachricht(x, &format!("GAMEJOIN.{},", "n".repeat(33)));
        // ungueltiger Username schlaegt vor "vergeben" an
        c.bei_nachricht(x, &format!("GAMEJOIN.lobby1,{}", "u".repeat(27)));
        c.bei_nachricht(x, "GAMEJOIN.lobby1,alice");

        assert_eq!(
            alle(&mut rx_x),
            vec![
                text("GAMEJOIN_DENY.GAME_NAME_INVALID"),
                text("GAMEJOIN_DENY.USERNAME_INVALID"),
                text("GAMEJOIN_DENY.USERNAME_TAKEN"),
            ]
        );
        assert_eq!(c.zustand(&x), VerbindungsZustand::Verbindend, "bleibt Verbindend");
    }

    #[tokio::test]
    async fn volle_sitzung_wird_abgelehnt() {
        let (c, b) = controller();
        let mut receivers = Vec::new();
        for i in 0..5 {
            let (id, rx) = oeffnen(&c, &b);
            c.bei_nachricht(id, &format!("GAMEJOIN.voll,spieler{i}"));
            receivers.push(rx);
        }
        let (sechster, mut rx) = oeffnen(&c, &b);
        c.bei_nachricht(sechster, "GAMEJOIN.voll,spieler5");

        assert_eq!(alle(&mut rx), vec![text("GAMEJOIN_DENY.GAME_FULL")]);
        assert_eq!(c.registry().finden("voll").unwrap().anzahl(), 5);
    }

    #[tokio::test]
    async fn konfigurierte_obergrenze_ueber_fuenf_greift_nicht() {
        let b = EventBroadcaster::neu();
        let c = LobbyController::neu(
            Arc::new(LobbyConfig {
                max_spieler: 8,
                ..LobbyConfig::default()
            }),
            SessionRegistry::neu(),
            b.clone(),
            Arc::new(KeinArchiv),
        );
        let mut antworten = Vec::new();
        for i in 0..8 {
            let (id, mut rx) = oeffnen(&c, &b);
            c.bei_nachricht(id, &format!("GAMEJOIN.gross,spieler{i}"));
            antworten.push(alle(&mut rx).into_iter().next());
        }

        assert_eq!(c.registry().finden("gross").unwrap().anzahl(), 5);
        for antwort in &antworten[5..] {
            assert_eq!(antwort, &Some(text("GAMEJOIN_DENY.GAME_FULL")));
        }
    }

    #[tokio::test]
    async fn impliziter_beitritt_beim_oeffnen() {
        let (c, b) = controller();
        let id = ConnectionId::new();
        let mut rx = b.client_registrieren(id);
        c.bei_oeffnung(
            id,
            BeitrittsParameter {
                spiel: Some("lobby1".into()),
                username: Some("alice".into()),
            },
        );

        assert_eq!(alle(&mut rx), vec![text("GAMEJOIN_ACCEPT.alice")]);
        assert_eq!(c.zustand(&id), VerbindungsZustand::Beigetreten);
    }

    #[tokio::test]
    async fn impliziter_beitritt_abgelehnt_schliesst_verbindung() {
        let (c, b) = controller();
        let id = ConnectionId::new();
        let mut rx = b.client_registrieren(id);
        c.bei_oeffnung(
            id,
            BeitrittsParameter {
                spiel: Some("lobby1".into()),
                username: None,
            },
        );

        assert_eq!(
            alle(&mut rx),
            vec![
                text("GAMEJOIN_DENY.USERNAME_INVALID"),
                Ausgehend::Schliessen {
                    code: SchliessCode::UsernameUngueltig,
                    grund: "USERNAME_INVALID".into()
                },
            ]
        );
        assert_eq!(c.zustand(&id), VerbindungsZustand::Geschlossen);
        assert!(c.registry().finden("lobby1").is_none());
    }

    #[tokio::test]
    async fn aktion_vor_start_nur_vom_besitzer_mit_quorum() {
        let (c, b) = controller();
        let (a, mut rx_a) = oeffnen(&c, &b);
        c.bei_nachricht(a, "GAMEJOIN.lobby1,alice");

        // Besitzer allein: kein Quorum
        c.bei_nachricht(a, "GAMEACTION.start");
        let (bob, mut rx_b) = oeffnen(&c, &b);
        c.bei_nachricht(bob, "GAMEJOIN.lobby1,bob");
        // Nicht-Besitzer
        c.bei_nachricht(bob, "GAMEACTION.start");

        assert!(!c.registry().finden("lobby1").unwrap().gestartet);
        assert_eq!(
            alle(&mut rx_a),
            vec![
                text("GAMEJOIN_ACCEPT.alice"),
                text("GAMEACTION_DENY.GAME_NOT_STARTED"),
                text("GAMEJOIN_ACCEPT.alice,bob"),
            ]
        );
        assert_eq!(
            alle(&mut rx_b),
            vec![
                text("GAMEJOIN_ACCEPT.alice,bob"),
                text("GAMEACTION_DENY.GAME_NOT_STARTED"),
            ]
        );

        c.bei_nachricht(a, "GAMEACTION.start");
        assert!(c.registry().finden("lobby1").unwrap().gestartet);
        assert_eq!(c.zustand(&bob), VerbindungsZustand::ImSpiel);

        // Im Spiel darf jeder
        c.bei_nachricht(bob, "GAMEACTION.zug");
        assert_eq!(
            alle(&mut rx_a),
            vec![text("GAMEACTION.start"), text("GAMEACTION.zug")]
        );
    }

    #[tokio::test]
    async fn verlassen_vor_start_aktualisiert_spielerliste() {
        let (c, b) = controller();
        let (a, _rx_a) = oeffnen(&c, &b);
        let (bob, mut rx_b) = oeffnen(&c, &b);
        c.bei_nachricht(a, "GAMEJOIN.lobby1,alice");
        c.bei_nachricht(bob, "GAMEJOIN.lobby1,bob");
        alle(&mut rx_b);

        c.bei_nachricht(a, "GAMELEAVE");

        assert_eq!(alle(&mut rx_b), vec![text("GAMELEAVE.bob")]);
        let s = c.registry().finden("lobby1").unwrap();
        assert_eq!(s.besitzer(), Some(bob));
        assert_eq!(c.zustand(&a), VerbindungsZustand::Geschlossen);
    }

    #[tokio::test]
    async fn protokollfehler_werden_verworfen() {
        let (c, b) = controller();
        let (a, mut rx) = oeffnen(&c, &b);

        c.bei_nachricht(a, "");
        c.bei_nachricht(a, "GAMEFOO.x");
        c.bei_nachricht(a, "GAMEJOIN.ohnekomma");
        c.bei_nachricht(a, "GAMEACTION.x"); // noch keiner Sitzung beigetreten
        c.bei_nachricht(a, "GAMEJOIN_ACCEPT.alice"); // Server-Ereignis vom Client

        assert!(alle(&mut rx).is_empty());
        assert_eq!(c.zustand(&a), VerbindungsZustand::Verbindend);
    }

    #[tokio::test]
    async fn zweiter_beitritt_wird_ignoriert() {
        let (c, b) = controller();
        let (a, mut rx) = oeffnen(&c, &b);
        c.bei_nachricht(a, "GAMEJOIN.lobby1,alice");
        c.bei_nachricht(a, "GAMEJOIN.lobby2,alice");

        assert_eq!(alle(&mut rx), vec![text("GAMEJOIN_ACCEPT.alice")]);
        assert!(c.registry().finden("lobby2").is_none());
    }

    #[tokio::test]
    async fn spielnachricht_geht_an_alle() {
        let (c, b) = controller();
        let (a, mut rx_a) = oeffnen(&c, &b);
        let (bob, mut rx_b) = oeffnen(&c, &b);
        c.bei_nachricht(a, "GAMEJOIN.lobby1,alice");
        c.bei_nachricht(bob, "GAMEJOIN.lobby1,bob");
        alle(&mut rx_a);
        alle(&mut rx_b);

        c.bei_nachricht(bob, "GAMEMSG.hallo%20alice");

        assert_eq!(alle(&mut rx_a), vec![text("GAMEMSG.hallo%20alice")]);
        assert_eq!(alle(&mut rx_b), vec![text("GAMEMSG.hallo%20alice")]);
        assert!(!c.registry().finden("lobby1").unwrap().gestartet);
    }

    #[tokio::test]
    async fn pong_verhindert_timeout() {
        let (c, b) = controller();
        let (a, mut rx) = oeffnen(&c, &b);
        let grenze = c.config().timeout_grenze();

        c.bei_pong(a);
        let ergebnis = c.liveness_sweep(Instant::now() + grenze - Duration::from_secs(1));
        assert!(ergebnis.entfernt.is_empty());
        assert_eq!(ergebnis.angepingt, 1);
        assert_eq!(alle(&mut rx), vec![Ausgehend::Ping]);

        let ergebnis = c.liveness_sweep(Instant::now() + grenze + Duration::from_secs(1));
        assert_eq!(ergebnis.entfernt, vec![a]);
        assert_eq!(c.zustand(&a), VerbindungsZustand::Geschlossen);
    }
}
