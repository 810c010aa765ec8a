//! Nachrichten-Codec fuer den Umschlag `EVENT.payload`
//!
//! ## Format
//!
//! ```text
//! GAMEJOIN.lobby1,alice
//! ^^^^^^^^ ^^^^^^^^^^^^
//! Ereignis Nutzlast (Schema je Ereignis)
//! ```
//!
//! Getrennt wird am ersten `.`, die Nutzlast darf also selbst Punkte
//! enthalten. Spielerlisten werden kommagetrennt uebertragen, eine leere
//! Liste als Literal `EMPTY`.
//!
//! Das Dekodieren ist strikt: alles ausserhalb der bekannten Ereignisse
//! liefert einen [`ProtokollFehler`], den der Aufrufer stillschweigend
//! verwirft.

use crate::control::{AktionVerweigert, BeitrittVerweigert, EndGrund};
use crate::error::{ProtokollFehler, ProtokollResult};

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Trennzeichen zwischen Ereignis und Nutzlast
pub const EREIGNIS_TRENNER: char = '.';

/// Trennzeichen innerhalb von Nutzlasten (Join-Felder, Spielerlisten)
pub const FELD_TRENNER: char = ',';

/// Wire-Darstellung einer leeren Spielerliste
pub const LEERE_LISTE: &str = "EMPTY";

pub const GAMEJOIN: &str = "GAMEJOIN";
pub const GAMEJOIN_ACCEPT: &str = "GAMEJOIN_ACCEPT";
pub const GAMEJOIN_DENY: &str = "GAMEJOIN_DENY";
pub const GAMELEAVE: &str = "GAMELEAVE";
pub const GAMEACTION: &str = "GAMEACTION";
pub const GAMEACTION_DENY: &str = "GAMEACTION_DENY";
pub const GAMEEND: &str = "GAMEEND";
pub const GAMEMSG: &str = "GAMEMSG";

// ---------------------------------------------------------------------------
// Ereignis
// ---------------------------------------------------------------------------

/// Alle Ereignisse des Lobbyprotokolls (geschlossene Menge)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ereignis {
    /// `GAMEJOIN` – Client moechte einer Sitzung beitreten
    SpielBeitritt { spiel: String, username: String },
    /// `GAMEJOIN_ACCEPT` – aktuelle Spielerliste nach einem Beitritt
    BeitrittAkzeptiert(Vec<String>),
    /// `GAMEJOIN_DENY`
    BeitrittVerweigert(BeitrittVerweigert),
    /// `GAMELEAVE` – vom Client ohne Nutzlast, vom Server mit neuer Spielerliste
    SpielVerlassen(Vec<String>),
    /// `GAMEACTION` – opake Spielnutzlast, wird unveraendert weitergeleitet
    SpielAktion(String),
    /// `GAMEACTION_DENY`
    AktionVerweigert(AktionVerweigert),
    /// `GAMEEND`
    SpielEnde(EndGrund),
    /// `GAMEMSG` – URI-kodierter Freitext
    SpielNachricht(String),
}

impl Ereignis {
    /// Ereignis-Token auf dem Draht
    pub fn typ(&self) -> &'static str {
        match self {
            Self::SpielBeitritt { .. } => GAMEJOIN,
            Self::BeitrittAkzeptiert(_) => GAMEJOIN_ACCEPT,
            Self::BeitrittVerweigert(_) => GAMEJOIN_DENY,
            Self::SpielVerlassen(_) => GAMELEAVE,
            Self::SpielAktion(_) => GAMEACTION,
            Self::AktionVerweigert(_) => GAMEACTION_DENY,
            Self::SpielEnde(_) => GAMEEND,
            Self::SpielNachricht(_) => GAMEMSG,
        }
    }

    /// Kodiert das Ereignis als `EVENT.payload`
    pub fn kodieren(&self) -> String {
        let nutzlast = match self {
            Self::SpielBeitritt { spiel, username } => format!("{spiel}{FELD_TRENNER}{username}"),
            Self::BeitrittAkzeptiert(spieler) | Self::SpielVerlassen(spieler) => {
                spielerliste_kodieren(spieler)
            }
            Self::BeitrittVerweigert(grund) => grund.als_str().to_string(),
            Self::AktionVerweigert(grund) => grund.als_str().to_string(),
            Self::SpielEnde(grund) => grund.als_str().to_string(),
            Self::SpielAktion(nutzlast) | Self::SpielNachricht(nutzlast) => nutzlast.clone(),
        };
        kodieren(self.typ(), &nutzlast)
    }
}

// ---------------------------------------------------------------------------
// Kodieren / Dekodieren
// ---------------------------------------------------------------------------

/// Baut den Umschlag `"<EVENT>.<payload>"`
pub fn kodieren(ereignis: &str, nutzlast: &str) -> String {
    let mut s = String::with_capacity(ereignis.len() + 1 + nutzlast.len());
    s.push_str(ereignis);
    s.push(EREIGNIS_TRENNER);
    s.push_str(nutzlast);
    s
}

/// Dekodiert eine Rohnachricht in ein [`Ereignis`]
///
/// Eine Nachricht ohne `.` wird als Ereignis ohne Nutzlast gelesen, damit ein
/// nacktes `GAMELEAVE` akzeptiert wird.
pub fn dekodieren(roh: &str) -> ProtokollResult<Ereignis> {
    let (token, nutzlast) = match roh.split_once(EREIGNIS_TRENNER) {
        Some((token, nutzlast)) => (token, nutzlast),
        None => (roh, ""),
    };

    if token.is_empty() {
        return Err(ProtokollFehler::KeinEreignis);
    }

    match token {
        GAMEJOIN => {
            let (spiel, username) = nutzlast.split_once(FELD_TRENNER).ok_or_else(|| {
                ProtokollFehler::nutzlast(GAMEJOIN, "erwartet 'spielName,username'")
            })?;
            Ok(Ereignis::SpielBeitritt {
                spiel: spiel.to_string(),
                username: username.to_string(),
            })
        }
        GAMEJOIN_ACCEPT => Ok(Ereignis::BeitrittAkzeptiert(spielerliste_dekodieren(nutzlast))),
        GAMEJOIN_DENY => Ok(Ereignis::BeitrittVerweigert(nutzlast.parse()?)),
        GAMELEAVE => Ok(Ereignis::SpielVerlassen(spielerliste_dekodieren(nutzlast))),
        GAMEACTION => Ok(Ereignis::SpielAktion(nutzlast.to_string())),
        GAMEACTION_DENY => Ok(Ereignis::AktionVerweigert(nutzlast.parse()?)),
        GAMEEND => Ok(Ereignis::SpielEnde(nutzlast.parse()?)),
        GAMEMSG => Ok(Ereignis::SpielNachricht(nutzlast.to_string())),
        unbekannt => Err(ProtokollFehler::UnbekanntesEreignis(unbekannt.to_string())),
    }
}

/// Kodiert eine Spielerliste (`EMPTY` wenn leer)
pub fn spielerliste_kodieren<S: AsRef<str>>(spieler: &[S]) -> String {
    if spieler.is_empty() {
        return LEERE_LISTE.to_string();
    }
    spieler
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(",")
}

/// Dekodiert eine Spielerliste; `EMPTY` und leere Nutzlast ergeben eine leere Liste
pub fn spielerliste_dekodieren(nutzlast: &str) -> Vec<String> {
    if nutzlast.is_empty() || nutzlast == LEERE_LISTE {
        return Vec::new();
    }
    nutzlast.split(FELD_TRENNER).map(str::to_string).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beitritt_dekodieren() {
        let e = dekodieren("GAMEJOIN.lobby1,alice").unwrap();
        assert_eq!(
            e,
            Ereignis::SpielBeitritt {
                spiel: "lobby1".into(),
                username: "alice".into()
            }
        );
    }

    #[test]
    fn beitritt_trennt_am_ersten_komma() {
        let e = dekodieren("GAMEJOIN.lobby,a,b").unwrap();
        assert_eq!(
            e,
            Ereignis::SpielBeitritt {
                spiel: "lobby".into(),
                username: "a,b".into()
            }
        );
    }

    #[test]
    fn beitritt_ohne_komma_ist_protokollfehler() {
        assert!(matches!(
            dekodieren("GAMEJOIN.lobby1"),
            Err(ProtokollFehler::UngueltigeNutzlast { ereignis: GAMEJOIN, .. })
        ));
    }

    #[test]
    fn nutzlast_darf_punkte_enthalten() {
        let e = dekodieren("GAMEACTION.move.3.4").unwrap();
        assert_eq!(e, Ereignis::SpielAktion("move.3.4".into()));
    }

    #[test]
    fn nacktes_gameleave_wird_akzeptiert() {
        assert_eq!(dekodieren("GAMELEAVE").unwrap(), Ereignis::SpielVerlassen(vec![]));
        assert_eq!(dekodieren("GAMELEAVE.").unwrap(), Ereignis::SpielVerlassen(vec![]));
    }

    #[test]
    fn unbekanntes_und_fehlendes_ereignis() {
        assert_eq!(
            dekodieren("GAMEFOO.bar"),
            Err(ProtokollFehler::UnbekanntesEreignis("GAMEFOO".into()))
        );
        assert_eq!(dekodieren(""), Err(ProtokollFehler::KeinEreignis));
        assert_eq!(dekodieren(".payload"), Err(ProtokollFehler::KeinEreignis));
        assert!(dekodieren("gamejoin.a,b").is_err(), "Tokens sind case-sensitiv");
    }

    #[test]
    fn spielerliste_kodieren_leer_und_voll() {
        let leer: Vec<String> = vec![];
        assert_eq!(Ereignis::BeitrittAkzeptiert(leer).kodieren(), "GAMEJOIN_ACCEPT.EMPTY");
        assert_eq!(
            Ereignis::BeitrittAkzeptiert(vec!["alice".into(), "bob".into()]).kodieren(),
            "GAMEJOIN_ACCEPT.alice,bob"
        );
        assert_eq!(spielerliste_dekodieren("EMPTY"), Vec::<String>::new());
    }

    #[test]
    fn gruende_werden_kodiert() {
        assert_eq!(
            Ereignis::BeitrittVerweigert(BeitrittVerweigert::UsernameVergeben).kodieren(),
            "GAMEJOIN_DENY.USERNAME_TAKEN"
        );
        assert_eq!(
            Ereignis::AktionVerweigert(AktionVerweigert::SpielNichtGestartet).kodieren(),
            "GAMEACTION_DENY.GAME_NOT_STARTED"
        );
        assert_eq!(
            Ereignis::SpielEnde(EndGrund::SpielerVerlassen).kodieren(),
            "GAMEEND.PLAYER_LEFT"
        );
    }

    #[test]
    fn unbekannter_ablehnungsgrund_ist_protokollfehler() {
        assert!(dekodieren("GAMEJOIN_DENY.WHATEVER").is_err());
        assert!(dekodieren("GAMEEND.").is_err());
    }

    #[test]
    fn nachricht_bleibt_unveraendert() {
        let e = dekodieren("GAMEMSG.hallo%20welt").unwrap();
        assert_eq!(e, Ereignis::SpielNachricht("hallo%20welt".into()));
        assert_eq!(e.kodieren(), "GAMEMSG.hallo%20welt");
    }
}
