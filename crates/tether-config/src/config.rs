//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tether_sync::{CompressionConfig, GameMode, SyncSettings};

use crate::error::ConfigError;

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Scenario synchronization settings.
    pub sync: SyncConfig,
    /// Network/multiplayer settings.
    pub network: NetworkConfig,
    /// Session settings used when no server dictates them.
    pub session: SessionConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Scenario synchronization configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    /// Milliseconds between outbound scans of live scenario modules.
    pub scan_interval_ms: u64,
    /// Minimum encoded size (bytes) before LZ4 is applied.
    pub compression_threshold: usize,
    /// Whether payload compression is enabled at all.
    pub compression_enabled: bool,
    /// Modules that are never sent and never accepted from the network.
    pub permanently_blocked: Vec<String>,
    /// Name of the progression/research module.
    pub progression_module: String,
    /// Game modes in which the progression module is synchronized.
    pub progression_modes: Vec<GameMode>,
    /// Game modes in which a default progression module is fabricated
    /// when none was ever observed.
    pub fabrication_modes: Vec<GameMode>,
    /// Maximum nesting depth accepted when decoding a module document.
    pub max_document_depth: usize,
}

/// Network/multiplayer configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Server address for multiplayer.
    pub server_address: String,
    /// Server port.
    pub server_port: u16,
    /// Client timeout in seconds.
    pub timeout_seconds: u32,
}

/// Session configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Game mode for locally simulated sessions.
    pub game_mode: GameMode,
    /// Player name announced to the server.
    pub player_name: String,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Dump every received and fabricated document at debug level.
    pub dump_documents: bool,
}

// --- Default implementations ---

impl Default for SyncConfig {
    fn default() -> Self {
        let settings = SyncSettings::default();
        Self {
            scan_interval_ms: settings.scan_interval.as_millis() as u64,
            compression_threshold: settings.compression.threshold,
            compression_enabled: settings.compression.enabled,
            permanently_blocked: settings.permanently_blocked,
            progression_module: settings.progression_module,
            progression_modes: settings.progression_modes,
            fabrication_modes: settings.fabrication_modes,
            max_document_depth: settings.max_document_depth,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            server_address: "127.0.0.1".to_string(),
            server_port: 6702,
            timeout_seconds: 30,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            game_mode: GameMode::Career,
            player_name: "player".to_string(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            dump_documents: false,
        }
    }
}

impl SyncConfig {
    /// Builds the engine settings described by this section.
    pub fn to_settings(&self) -> SyncSettings {
        SyncSettings {
            scan_interval: Duration::from_millis(self.scan_interval_ms),
            compression: CompressionConfig {
                threshold: self.compression_threshold,
                enabled: self.compression_enabled,
            },
            max_document_depth: self.max_document_depth,
            permanently_blocked: self.permanently_blocked.clone(),
            progression_module: self.progression_module.clone(),
            progression_modes: self.progression_modes.clone(),
            fabrication_modes: self.fabrication_modes.clone(),
            dump_documents: false,
        }
    }
}

impl Config {
    /// Engine settings with the debug toggles applied.
    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            dump_documents: self.debug.dump_documents,
            ..self.sync.to_settings()
        }
    }
}

/// Platform config directory for Tether (`<config_dir>/tether`).
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tether"))
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let config = read_config(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::Write {
            path: config_path.clone(),
            source,
        })?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = read_config(&config_dir.join("config.ron"))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
