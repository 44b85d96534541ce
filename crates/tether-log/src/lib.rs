//! Structured logging for Tether.
//!
//! Every diagnostic the synchronization engine emits goes through `tracing`.
//! This crate installs the subscriber: console output with uptime and module
//! paths, plus JSON file logging in debug builds for post-mortem analysis of
//! a session. The filter comes from `RUST_LOG` or the config's log level.

use std::path::Path;

use tether_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config provides one.
pub const DEFAULT_FILTER: &str = "info,tether_sync=debug";

/// Name of the JSON log file written in debug builds.
pub const LOG_FILE_NAME: &str = "tether.log";

/// Resolve the filter string: config override first, then [`DEFAULT_FILTER`].
pub fn filter_directive(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.debug.log_level.is_empty() => config.debug.log_level.clone(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Initialize the tracing subscriber.
///
/// Sets up:
/// - Console output with uptime, module paths, and severity levels
/// - JSON file logging to `log_dir/tether.log` in debug builds
/// - Environment-based filtering (respects RUST_LOG)
///
/// # Examples
///
/// ```no_run
/// use tether_log::init_logging;
/// use tether_config::Config;
///
/// init_logging(None, false, None);
///
/// let config = Config::default();
/// init_logging(Some(std::path::Path::new("./logs")), true, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let filter_str = filter_directive(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true) // the relay thread is named
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join(LOG_FILE_NAME))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        // A second init (tests, embedding hosts) keeps the existing subscriber.
        let _ = subscriber.with(file_layer).try_init();
        return;
    }

    let _ = subscriber.try_init();
}

/// Create an `EnvFilter` with [`DEFAULT_FILTER`].
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}
