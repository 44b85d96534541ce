//! Per-module send/receive policy.
//!
//! The decision is a pure function of the module name and the current game
//! mode. Nothing here is cached: callers evaluate the policy every time they
//! need it, so a mode switch takes effect on the very next scan or merge.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::settings::SyncSettings;

/// Session game mode, as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    /// No progression, funds, or reputation.
    Sandbox,
    /// Science progression only.
    Science,
    /// Full progression with funds and contracts.
    Career,
}

impl GameMode {
    /// Lowercase name used on the command line and in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sandbox => "sandbox",
            Self::Science => "science",
            Self::Career => "career",
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A game mode string did not name a known mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown game mode '{0}' (expected sandbox, science, or career)")]
pub struct ParseGameModeError(pub String);

impl FromStr for GameMode {
    type Err = ParseGameModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Self::Sandbox),
            "science" => Ok(Self::Science),
            "career" => Ok(Self::Career),
            _ => Err(ParseGameModeError(s.to_string())),
        }
    }
}

/// Outcome of evaluating the policy for one module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// The module may be sent and merged.
    Allowed,
    /// The module's truth is always local: never sent, never merged.
    PermanentlyBlocked,
    /// The module is meaningless in the current game mode.
    ModeBlocked,
}

/// Which modules are permanently local, and which only exist in some modes.
#[derive(Debug, Clone, Default)]
pub struct GatePolicy {
    permanently_blocked: HashSet<String>,
    mode_rules: HashMap<String, Vec<GameMode>>,
}

impl GatePolicy {
    /// A policy that allows everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the policy described by `settings`: its permanent blocks plus
    /// the progression module restricted to its progression modes.
    pub fn from_settings(settings: &SyncSettings) -> Self {
        let mut policy = Self::new();
        for name in &settings.permanently_blocked {
            policy.block_permanently(name);
        }
        policy.restrict_to_modes(&settings.progression_module, &settings.progression_modes);
        policy
    }

    /// Never send or merge `module_name`.
    pub fn block_permanently(&mut self, module_name: &str) {
        self.permanently_blocked.insert(module_name.to_string());
    }

    /// Only synchronize `module_name` while the session is in one of `modes`.
    pub fn restrict_to_modes(&mut self, module_name: &str, modes: &[GameMode]) {
        self.mode_rules
            .insert(module_name.to_string(), modes.to_vec());
    }

    /// Evaluates the policy for `module_name` under `mode`.
    pub fn evaluate(&self, module_name: &str, mode: GameMode) -> Gate {
        if self.permanently_blocked.contains(module_name) {
            return Gate::PermanentlyBlocked;
        }
        match self.mode_rules.get(module_name) {
            Some(modes) if !modes.contains(&mode) => Gate::ModeBlocked,
            _ => Gate::Allowed,
        }
    }

    /// Names of all permanently blocked modules.
    pub fn permanently_blocked(&self) -> impl Iterator<Item = &str> {
        self.permanently_blocked.iter().map(String::as_str)
    }
}
