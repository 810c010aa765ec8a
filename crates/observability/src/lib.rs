//! # gamerelay-observability
//!
//! Structured Logging fuer GameRelay via tracing-subscriber. Text- oder
//! JSON-Ausgabe, Level und Format per Konfiguration oder Umgebungsvariable.

pub mod logging;

pub use logging::{
    logging_initialisieren, LogEinstellungen, LogFormat, LoggingFehler, LOG_FORMAT_ENV,
    LOG_LEVEL_ENV,
};
