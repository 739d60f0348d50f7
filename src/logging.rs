// src/logging.rs

//! Diagnostics go to stderr through `tracing`; stdout is reserved for
//! protocol frames.
//!
//! The filter comes from `--log-level` when given, otherwise from the
//! `NODEJOB_LOG` environment variable, which accepts full `EnvFilter`
//! directives such as `nodejob::supervisor=debug,warn`. With neither set,
//! `info` applies.

use anyhow::{Result, anyhow};
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Environment variable consulted when no `--log-level` is passed.
pub const LOG_ENV: &str = "NODEJOB_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Install the process-wide subscriber. Fails if one is already set.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let (filter, rejected) = select_filter(cli_level, env.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing tracing subscriber: {e}"))?;

    if let Some(value) = rejected {
        warn!(%value, "ignoring unparseable {LOG_ENV}; using '{DEFAULT_DIRECTIVE}'");
    }
    Ok(())
}

/// Returns the filter plus the env value if it had to be discarded.
fn select_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> (EnvFilter, Option<String>) {
    if let Some(level) = cli_level {
        return (EnvFilter::new(level.directive()), None);
    }

    match env.map(str::trim).filter(|v| !v.is_empty()) {
        None => (EnvFilter::new(DEFAULT_DIRECTIVE), None),
        Some(value) => match EnvFilter::try_new(value) {
            Ok(filter) => (filter, None),
            Err(_) => (EnvFilter::new(DEFAULT_DIRECTIVE), Some(value.to_string())),
        },
    }
}
