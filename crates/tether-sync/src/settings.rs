//! Engine settings and well-known module names.

use std::time::Duration;

use crate::compression::CompressionConfig;
use crate::gating::GameMode;

/// Asteroid/discoverable object records. Always generated locally.
pub const DISCOVERED_OBJECTS_MODULE: &str = "ScenarioDiscoverableObjects";

/// Research and development progression.
pub const RESEARCH_MODULE: &str = "ResearchAndDevelopment";

/// Default time between outbound scans.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(30);

/// Default maximum nesting depth of a decoded document.
pub const DEFAULT_MAX_DOCUMENT_DEPTH: usize = 64;

/// Settings for one [`ScenarioSync`](crate::ScenarioSync) engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    /// Minimum time between two outbound scans.
    pub scan_interval: Duration,
    /// Payload compression rules.
    pub compression: CompressionConfig,
    /// Documents nested deeper than this are rejected on decode.
    pub max_document_depth: usize,
    /// Modules never sent and never merged from the network.
    pub permanently_blocked: Vec<String>,
    /// Name of the progression/research module.
    pub progression_module: String,
    /// Modes in which the progression module is synchronized at all.
    pub progression_modes: Vec<GameMode>,
    /// Modes that require progression data; a default is fabricated when
    /// none was ever observed.
    pub fabrication_modes: Vec<GameMode>,
    /// Log every decoded and fabricated document at debug level.
    pub dump_documents: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            scan_interval: DEFAULT_SCAN_INTERVAL,
            compression: CompressionConfig::default(),
            max_document_depth: DEFAULT_MAX_DOCUMENT_DEPTH,
            permanently_blocked: vec![DISCOVERED_OBJECTS_MODULE.to_string()],
            progression_module: RESEARCH_MODULE.to_string(),
            progression_modes: vec![GameMode::Career, GameMode::Science],
            fabrication_modes: vec![GameMode::Career],
            dump_documents: false,
        }
    }
}
