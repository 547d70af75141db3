//! Structured logging for the Strata generator.
//!
//! Installs a `tracing` subscriber with console output (uptime timestamps,
//! module paths, thread names) and an optional JSON file layer. The level comes
//! from `RUST_LOG` when set, otherwise from the configuration.

use std::path::Path;

use strata_config::Config;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config names a level.
pub const DEFAULT_FILTER: &str = "info";

/// Name of the JSON log file written inside `log_dir`.
pub const LOG_FILE_NAME: &str = "strata.log";

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file; only used when
///   `config.debug.log_to_file` is set
/// * `config` - optional configuration providing the level and file toggle
///
/// Calling this more than once is harmless: later calls leave the first
/// subscriber in place and return `false`.
///
/// ```no_run
/// use strata_config::Config;
/// use strata_log::init_logging;
///
/// init_logging(None, Some(&Config::default()));
/// ```
pub fn init_logging(log_dir: Option<&Path>, config: Option<&Config>) -> bool {
    let directive = filter_directive(config);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&directive));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let log_to_file = config.is_some_and(|c| c.debug.log_to_file);
    let log_path = log_dir
        .filter(|_| log_to_file)
        .map(|dir| dir.join(LOG_FILE_NAME));
    let file_layer = log_path.as_ref().and_then(|path| {
        let dir = path.parent()?;
        std::fs::create_dir_all(dir).ok()?;
        let log_file = std::fs::File::create(path).ok()?;
        Some(
            fmt::layer()
                .with_writer(log_file)
                .with_ansi(false)
                .with_target(true)
                .with_timer(fmt::time::uptime())
                .json(),
        )
    });
    let file_enabled = file_layer.is_some();

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    if installed {
        info!(filter = %directive, file_logging = file_enabled, "logging initialized");
        if log_to_file && !file_enabled {
            warn!(dir = ?log_dir, "file logging requested but no log file could be opened");
        }
    }
    installed
}

/// The filter directive implied by `config`, ignoring `RUST_LOG`.
pub fn filter_directive(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.debug.log_level.trim().is_empty() => {
            config.debug.log_level.trim().to_string()
        }
        _ => DEFAULT_FILTER.to_string(),
    }
}
