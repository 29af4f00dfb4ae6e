// src/tag/mod.rs

//! Version labels for mutable artifacts such as container images.
//!
//! Two policies exist. `Timestamp` appends the UTC time at second precision to
//! a prefix: unique per second, but a rerun with unchanged sources still gets a
//! new tag. `Content` appends the short fingerprint of the artifact's source,
//! so the tag only moves when the content does. An optional alias (typically
//! `latest`) is carried along for humans and is never a change signal.

pub mod clock;

use std::sync::LazyLock;

use anyhow::anyhow;
use regex::Regex;
use tracing::debug;

use crate::errors::{BuildstampError, Result};
use crate::fingerprint::Fingerprint;
use crate::types::TagPolicy;

pub use clock::{Clock, SteppingClock, SystemClock};

/// `strftime` layout of the timestamp policy.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Container registry tag grammar.
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}$").expect("static regex"));

/// What to tag and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSpec {
    pub name: String,
    /// Source tree whose fingerprint feeds the content policy.
    pub source: String,
    pub prefix: String,
    pub policy: TagPolicy,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactTag {
    pub artifact: String,
    pub tag: String,
    pub alias: Option<String>,
}

pub struct ArtifactTagger<C: Clock> {
    clock: C,
}

impl<C: Clock> ArtifactTagger<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    /// `prefix` followed by the current UTC time, e.g. `rag-20240611093005`.
    pub fn timestamp_tag(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.clock.now().format(TIMESTAMP_FORMAT))
    }

    /// Tag one artifact. `fingerprint` is required by the content policy and
    /// ignored by the timestamp policy.
    pub fn tag(&self, spec: &ArtifactSpec, fingerprint: Option<&Fingerprint>) -> Result<ArtifactTag> {
        let tag = match spec.policy {
            TagPolicy::Timestamp => self.timestamp_tag(&spec.prefix),
            TagPolicy::Content => {
                let fp = fingerprint.ok_or_else(|| {
                    BuildstampError::Other(anyhow!(
                        "artifact '{}' uses the content policy but no fingerprint was given",
                        spec.name
                    ))
                })?;
                content_tag(&spec.prefix, fp)
            }
        };

        if !is_valid_tag(&tag) {
            return Err(BuildstampError::ConfigError(format!(
                "artifact '{}' produced an invalid tag `{}`",
                spec.name, tag
            )));
        }

        debug!(artifact = %spec.name, policy = ?spec.policy, tag = %tag, "tagged artifact");
        Ok(ArtifactTag {
            artifact: spec.name.clone(),
            tag,
            alias: spec.alias.clone(),
        })
    }
}

/// `prefix` followed by the short fingerprint.
pub fn content_tag(prefix: &str, fingerprint: &Fingerprint) -> String {
    format!("{prefix}{}", fingerprint.short())
}

pub fn is_valid_tag(tag: &str) -> bool {
    TAG_RE.is_match(tag)
}

/// Check that `prefix` can start a valid tag under either policy.
///
/// Timestamps are the longer suffix (14 characters), so they bound the length.
pub fn validate_prefix(prefix: &str) -> std::result::Result<(), String> {
    let sample = format!("{prefix}{}", "0".repeat(14));
    if is_valid_tag(&sample) {
        Ok(())
    } else {
        Err(format!(
            "tag prefix `{prefix}` does not fit the tag grammar [A-Za-z0-9_][A-Za-z0-9_.-]{{0,127}}"
        ))
    }
}
