//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable, die Vorrang vor der
//! Konfigurationsdatei hat:
//! - `GR_LOG_LEVEL`: Filter-Direktive (z.B. `info` oder
//!   `gamerelay_lobby=debug,info`), Standard: info
//! - `GR_LOG_FORMAT`: Format (text/json), Standard: text

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::{fmt as sub_fmt, EnvFilter};

pub const LOG_LEVEL_ENV: &str = "GR_LOG_LEVEL";
pub const LOG_FORMAT_ENV: &str = "GR_LOG_FORMAT";

/// Fehler beim Einrichten des Loggings
#[derive(Debug, thiserror::Error)]
pub enum LoggingFehler {
    #[error("Ungueltiges Log-Format: '{0}' (erlaubt: text, json)")]
    UngueltigesFormat(String),

    #[error("Ungueltiger Log-Filter '{direktive}': {grund}")]
    UngueltigerFilter { direktive: String, grund: String },

    #[error("Logging bereits initialisiert: {0}")]
    BereitsInitialisiert(String),
}

/// Ausgabeformat der Log-Zeilen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingFehler;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            andere => Err(LoggingFehler::UngueltigesFormat(andere.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Aufgeloeste Logging-Einstellungen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEinstellungen {
    /// EnvFilter-Direktive
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl LogEinstellungen {
    pub fn neu(level: impl Into<String>, format: LogFormat) -> Self {
        Self {
            level: level.into(),
            format,
        }
    }

    /// Wendet `GR_LOG_LEVEL` / `GR_LOG_FORMAT` aus der Umgebung an
    pub fn mit_umgebung(self) -> Result<Self, LoggingFehler> {
        self.ueberschreiben(
            std::env::var(LOG_LEVEL_ENV).ok(),
            std::env::var(LOG_FORMAT_ENV).ok(),
        )
    }

    /// Gesetzte, nicht-leere Werte ersetzen die bisherigen
    pub fn ueberschreiben(
        mut self,
        level: Option<String>,
        format: Option<String>,
    ) -> Result<Self, LoggingFehler> {
        if let Some(level) = level.filter(|l| !l.trim().is_empty()) {
            self.level = level;
        }
        if let Some(format) = format.filter(|f| !f.trim().is_empty()) {
            self.format = format.trim().parse()?;
        }
        Ok(self)
    }

    fn filter(&self) -> Result<EnvFilter, LoggingFehler> {
        EnvFilter::try_new(&self.level).map_err(|e| LoggingFehler::UngueltigerFilter {
            direktive: self.level.clone(),
            grund: e.to_string(),
        })
    }
}

/// Initialisiert den globalen tracing-Subscriber
///
/// Darf pro Prozess nur einmal erfolgreich aufgerufen werden.
pub fn logging_initialisieren(einstellungen: &LogEinstellungen) -> Result<(), LoggingFehler> {
    let filter = einstellungen.filter()?;

    let ergebnis = match einstellungen.format {
        LogFormat::Json => sub_fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => sub_fmt().with_env_filter(filter).with_target(true).try_init(),
    };
    ergebnis.map_err(|e| LoggingFehler::BereitsInitialisiert(e.to_string()))?;

    tracing::debug!(level = %einstellungen.level, format = %einstellungen.format, "Logging initialisiert");
    Ok(())
}
