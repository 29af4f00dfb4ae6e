// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::default_config_path;
use crate::types::OutputFormat;

/// Command-line arguments for `buildstamp`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "buildstamp",
    version,
    about = "Fingerprint source trees and export deployment configuration.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML). Defaults to `Buildstamp.toml`.
    ///
    /// Source paths inside it are relative to its directory.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUILDSTAMP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

impl CliArgs {
    /// The `--config` path, or the default config file.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(default_config_path)
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the files a source resolves to, in hashing order.
    Files {
        /// Source name (`[source.<name>]`).
        source: String,
    },

    /// Print `name fingerprint` for each source (all sources by default).
    Fingerprint {
        sources: Vec<String>,

        /// Print a TOML stamp file instead, suitable for `plan --previous`.
        #[arg(long)]
        stamps: bool,
    },

    /// Print the tag of an artifact.
    Tag {
        /// Artifact name (`[artifact.<name>]`).
        artifact: String,
    },

    /// Resolve `[export.values]` and print the bundle.
    Export {
        /// Resource outputs (TOML, or JSON when the extension is `.json`).
        #[arg(long, value_name = "PATH")]
        outputs: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Compare fingerprints with a previous stamp file and print what needs
    /// rebuilding.
    Plan {
        /// Stamp file from an earlier `fingerprint --stamps` run.
        #[arg(long, value_name = "PATH")]
        previous: Option<PathBuf>,
    },

    /// Print a line whenever a source's fingerprint changes.
    Watch,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
