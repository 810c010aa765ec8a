//! Ablehnungsgruende, Spielende-Gruende und Schliess-Codes
//!
//! Alle Gruende haben eine feste Wire-Darstellung (z.B. `GAME_FULL`), die
//! als Nutzlast der entsprechenden Ereignisse uebertragen wird.

use std::fmt;
use std::str::FromStr;

use crate::error::ProtokollFehler;

// ---------------------------------------------------------------------------
// BeitrittVerweigert
// ---------------------------------------------------------------------------

/// Grund fuer ein abgelehntes `GAMEJOIN`
///
/// Die Reihenfolge der Varianten entspricht der Reihenfolge der Pruefungen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BeitrittVerweigert {
    /// Spielname leer oder zu lang
    SpielnameUngueltig,
    /// Benutzername leer, zu lang oder mit Trennzeichen
    UsernameUngueltig,
    /// Benutzername in der Sitzung bereits vergeben
    UsernameVergeben,
    /// Sitzung hat bereits die maximale Spielerzahl
    SpielVoll,
}

impl BeitrittVerweigert {
    /// Wire-Darstellung des Grundes
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::SpielnameUngueltig => "GAME_NAME_INVALID",
            Self::UsernameUngueltig => "USERNAME_INVALID",
            Self::UsernameVergeben => "USERNAME_TAKEN",
            Self::SpielVoll => "GAME_FULL",
        }
    }

    /// Schliess-Code, mit dem eine Verbindung bei diesem Grund getrennt wird
    pub fn schliess_code(&self) -> SchliessCode {
        match self {
            Self::SpielnameUngueltig => SchliessCode::SpielnameUngueltig,
            Self::UsernameUngueltig => SchliessCode::UsernameUngueltig,
            Self::UsernameVergeben => SchliessCode::UsernameVergeben,
            Self::SpielVoll => SchliessCode::SpielVoll,
        }
    }
}

impl fmt::Display for BeitrittVerweigert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.als_str())
    }
}

impl FromStr for BeitrittVerweigert {
    type Err = ProtokollFehler;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GAME_NAME_INVALID" => Ok(Self::SpielnameUngueltig),
            "USERNAME_INVALID" => Ok(Self::UsernameUngueltig),
            "USERNAME_TAKEN" => Ok(Self::UsernameVergeben),
            "GAME_FULL" => Ok(Self::SpielVoll),
            andere => Err(ProtokollFehler::nutzlast(
                "GAMEJOIN_DENY",
                format!("unbekannter Grund '{andere}'"),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// AktionVerweigert
// ---------------------------------------------------------------------------

/// Grund fuer ein abgelehntes `GAMEACTION`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AktionVerweigert {
    /// Spiel laeuft noch nicht und der Absender darf es nicht starten
    SpielNichtGestartet,
}

impl AktionVerweigert {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::SpielNichtGestartet => "GAME_NOT_STARTED",
        }
    }
}

impl fmt::Display for AktionVerweigert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.als_str())
    }
}

impl FromStr for AktionVerweigert {
    type Err = ProtokollFehler;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GAME_NOT_STARTED" => Ok(Self::SpielNichtGestartet),
            andere => Err(ProtokollFehler::nutzlast(
                "GAMEACTION_DENY",
                format!("unbekannter Grund '{andere}'"),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// EndGrund
// ---------------------------------------------------------------------------

/// Grund fuer ein `GAMEEND`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndGrund {
    /// Ein Spieler hat das laufende Spiel verlassen
    SpielerVerlassen,
    /// Ein Spieler hat nicht mehr auf Liveness-Pings geantwortet
    SpielerTimeout,
}

impl EndGrund {
    pub fn als_str(&self) -> &'static str {
        match self {
            Self::SpielerVerlassen => "PLAYER_LEFT",
            Self::SpielerTimeout => "PLAYER_TIMEOUT",
        }
    }
}

impl fmt::Display for EndGrund {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.als_str())
    }
}

impl FromStr for EndGrund {
    type Err = ProtokollFehler;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PLAYER_LEFT" => Ok(Self::SpielerVerlassen),
            "PLAYER_TIMEOUT" => Ok(Self::SpielerTimeout),
            andere => Err(ProtokollFehler::nutzlast(
                "GAMEEND",
                format!("unbekannter Grund '{andere}'"),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// SchliessCode
// ---------------------------------------------------------------------------

/// Numerische Codes fuer `closeWithReason`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchliessCode {
    /// Regulaeres Ende (`GAMELEAVE` vom Client)
    Normal,
    SpielnameUngueltig,
    UsernameUngueltig,
    UsernameVergeben,
    SpielVoll,
    /// Spieler hat verlassen oder wurde entfernt (Timeout, Spielende)
    SpielerEntfernt,
}

impl SchliessCode {
    /// Numerischer Wert des Codes
    pub fn code(&self) -> u16 {
        match self {
            Self::Normal => 1000,
            Self::SpielnameUngueltig => 4000,
            Self::UsernameUngueltig => 4001,
            Self::UsernameVergeben => 4003,
            Self::SpielVoll => 4004,
            Self::SpielerEntfernt => 4005,
        }
    }
}

impl fmt::Display for SchliessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beitritt_verweigert_schliess_codes() {
        assert_eq!(BeitrittVerweigert::SpielnameUngueltig.schliess_code().code(), 4000);
        assert_eq!(BeitrittVerweigert::UsernameUngueltig.schliess_code().code(), 4001);
        assert_eq!(BeitrittVerweigert::UsernameVergeben.schliess_code().code(), 4003);
        assert_eq!(BeitrittVerweigert::SpielVoll.schliess_code().code(), 4004);
        assert_eq!(SchliessCode::SpielerEntfernt.code(), 4005);
    }

    #[test]
    fn gruende_aus_wire_parsen() {
        assert_eq!(
            "USERNAME_TAKEN".parse::<BeitrittVerweigert>(),
            Ok(BeitrittVerweigert::UsernameVergeben)
        );
        assert_eq!("PLAYER_TIMEOUT".parse::<EndGrund>(), Ok(EndGrund::SpielerTimeout));
        assert!("player_left".parse::<EndGrund>().is_err(), "Gross-/Kleinschreibung zaehlt");
        assert!("NOPE".parse::<AktionVerweigert>().is_err());
    }
}
