// src/errors.rs

//! Crate-wide error type.
//!
//! Every variant is terminal for the current invocation: nothing is retried
//! internally and no partial fingerprint or bundle is ever returned.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildstampError {
    /// Source root is missing, not a directory, or cannot be listed.
    #[error("source unavailable: {path:?}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("invalid glob pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A file selected for hashing could not be read.
    #[error("cannot read {path:?}: {reason}")]
    AccessError { path: PathBuf, reason: String },

    #[error("source '{0}' resolved to an empty file set")]
    EmptySet(String),

    #[error("unresolved reference `{reference}` for key {key}")]
    UnresolvedReference { key: String, reference: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BuildstampError>;
