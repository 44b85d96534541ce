//! Command-line argument parsing for Tether.

use std::path::PathBuf;

use clap::Parser;
use tether_sync::GameMode;

use crate::Config;

/// Tether command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "tether", about = "Scenario synchronization client")]
pub struct CliArgs {
    /// Server address.
    #[arg(long)]
    pub server: Option<String>,

    /// Server port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Milliseconds between outbound scenario scans.
    #[arg(long)]
    pub scan_interval_ms: Option<u64>,

    /// Game mode (sandbox, science, career).
    #[arg(long)]
    pub mode: Option<GameMode>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of ticks to simulate before exiting.
    #[arg(long, default_value_t = 12)]
    pub ticks: u32,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref addr) = args.server {
            self.network.server_address = addr.clone();
        }
        if let Some(port) = args.port {
            self.network.server_port = port;
        }
        if let Some(interval) = args.scan_interval_ms {
            self.sync.scan_interval_ms = interval;
        }
        if let Some(mode) = args.mode {
            self.session.game_mode = mode;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
