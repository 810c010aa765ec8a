//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use gamerelay_core::MAX_SPIELER;
use gamerelay_lobby::{LobbyConfig, MAX_LIVENESS_INTERVALL_SEK};
use gamerelay_observability::{LogEinstellungen, LogFormat};
use serde::{Deserialize, Serialize};

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Lobby-Einstellungen (Kapazitaet, Liveness)
    pub lobby: LobbyEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer den WebSocket-Listener
    pub bind_adresse: String,
    /// Port fuer den WebSocket-Listener
    pub port: u16,
    /// Pfad des WebSocket-Endpunkts
    pub ws_pfad: String,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            port: 3000,
            ws_pfad: "/".into(),
        }
    }
}

/// Lobby-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LobbyEinstellungen {
    /// Maximale Spieler pro Sitzung
    pub max_spieler: usize,
    /// Periode `T` des Liveness-Sweeps; Timeout nach `2T`
    pub liveness_intervall_sek: u64,
    /// Groesse der Send-Queue pro Verbindung
    pub send_queue_groesse: usize,
}

impl Default for LobbyEinstellungen {
    fn default() -> Self {
        Self {
            max_spieler: MAX_SPIELER,
            liveness_intervall_sek: 60,
            send_queue_groesse: 64,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// EnvFilter-Direktive, z.B. "info" oder "gamerelay_lobby=debug,info"
    pub level: String,
    /// Format: "text" oder "json"
    pub format: LogFormat,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Text,
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        let config = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str::<Self>(&inhalt)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Logging ist hier noch nicht initialisiert
                eprintln!("Konfigurationsdatei '{pfad}' nicht gefunden, verwende Standardwerte");
                Self::default()
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
                ))
            }
        };
        config.pruefen()?;
        Ok(config)
    }

    /// Prueft Werte, die serde nicht ausschliessen kann
    pub fn pruefen(&self) -> anyhow::Result<()> {
        if self.lobby.max_spieler == 0 {
            anyhow::bail!("lobby.max_spieler muss groesser als 0 sein");
        }
        if self.lobby.max_spieler > MAX_SPIELER {
            anyhow::bail!(
                "lobby.max_spieler darf hoechstens {MAX_SPIELER} sein: {}",
                self.lobby.max_spieler
            );
        }
        if self.lobby.liveness_intervall_sek == 0 {
            anyhow::bail!("lobby.liveness_intervall_sek muss groesser als 0 sein");
        }
        if self.lobby.liveness_intervall_sek > MAX_LIVENESS_INTERVALL_SEK {
            anyhow::bail!(
                "lobby.liveness_intervall_sek darf hoechstens {MAX_LIVENESS_INTERVALL_SEK} sein: {}",
                self.lobby.liveness_intervall_sek
            );
        }
        if self.lobby.send_queue_groesse == 0 {
            anyhow::bail!("lobby.send_queue_groesse muss groesser als 0 sein");
        }
        if !self.netzwerk.ws_pfad.starts_with('/') {
            anyhow::bail!(
                "netzwerk.ws_pfad muss mit '/' beginnen: '{}'",
                self.netzwerk.ws_pfad
            );
        }
        Ok(())
    }

    /// Gibt die vollstaendige Bind-Adresse fuer den WebSocket-Listener zurueck
    pub fn bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.port)
    }

    /// Lobby-Konfiguration fuer den Controller
    pub fn lobby_config(&self) -> LobbyConfig {
        LobbyConfig {
            max_spieler: self.lobby.max_spieler.min(MAX_SPIELER),
            liveness_intervall_sek: self.lobby.liveness_intervall_sek,
            send_queue_groesse: self.lobby.send_queue_groesse,
        }
    }

    /// Logging-Einstellungen aus der Datei (ohne Umgebung)
    pub fn log_einstellungen(&self) -> LogEinstellungen {
        LogEinstellungen::neu(self.logging.level.clone(), self.logging.format)
    }
}
