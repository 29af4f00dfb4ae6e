use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::Deserialize;

/// What goes into the per-file digest of a source tree.
///
/// - `Content`: only the file bytes. Two files that swap names *and* contents
///   leave the fingerprint unchanged.
/// - `PathAndContent`: the relative path is hashed ahead of the bytes, so a
///   rename alone also changes the fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DigestMode {
    #[default]
    Content,
    PathAndContent,
}

impl FromStr for DigestMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "content" => Ok(DigestMode::Content),
            "path_and_content" => Ok(DigestMode::PathAndContent),
            other => Err(format!(
                "invalid digest mode: {other} (expected \"content\" or \"path_and_content\")"
            )),
        }
    }
}

/// How an artifact tag is derived.
///
/// - `Content`: prefix + short fingerprint of the artifact's source. Stable
///   while the source is unchanged (default).
/// - `Timestamp`: prefix + UTC wall-clock time at second precision. Unique per
///   invocation second but never idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TagPolicy {
    #[default]
    Content,
    Timestamp,
}

impl FromStr for TagPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "content" => Ok(TagPolicy::Content),
            "timestamp" => Ok(TagPolicy::Timestamp),
            other => Err(format!(
                "invalid tag policy: {other} (expected \"content\" or \"timestamp\")"
            )),
        }
    }
}

/// Rendering of an exported config bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Toml,
    Env,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutputFormat::Json => "json",
            OutputFormat::Toml => "toml",
            OutputFormat::Env => "env",
        };
        f.write_str(s)
    }
}
