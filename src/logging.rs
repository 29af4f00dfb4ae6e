// src/logging.rs

//! Logging setup for `buildstamp` using `tracing` + `tracing-subscriber`.
//!
//! The level comes from `--log-level`, then `BUILDSTAMP_LOG`, then `info`.
//! Logs go to STDERR; STDOUT carries fingerprints, tags and bundles only.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::cli::LogLevel;

/// Environment variable consulted when `--log-level` is absent.
pub const LOG_ENV: &str = "BUILDSTAMP_LOG";

/// Initialise the global subscriber. Call once, before any command runs.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let level = resolve_level(cli_level, env.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(level)?)
        .with_target(level >= Level::DEBUG)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing log subscriber: {e}"))?;

    Ok(())
}

/// Effective level: the CLI flag wins, an unparseable env value is ignored.
pub fn resolve_level(cli: Option<LogLevel>, env: Option<&str>) -> Level {
    cli.map(Level::from)
        .or_else(|| env.and_then(level_from_env))
        .unwrap_or(Level::INFO)
}

// The file watcher backend is chatty at debug; only `trace` lets it through.
fn log_filter(level: Level) -> Result<EnvFilter> {
    let mut filter = EnvFilter::default().add_directive(LevelFilter::from_level(level).into());
    if level < Level::TRACE {
        filter = filter.add_directive("notify=warn".parse()?);
    }
    Ok(filter)
}

fn level_from_env(s: &str) -> Option<Level> {
    match s.trim().to_ascii_lowercase().as_str() {
        "warning" => Some(Level::WARN),
        other => other.parse().ok(),
    }
}
