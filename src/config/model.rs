// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::{BuildstampError, Result};
use crate::export::{RUNTIME_KEYS, ValueSpec};
use crate::source::{SourceTree, effective_patterns};
use crate::tag::ArtifactSpec;
use crate::types::{DigestMode, TagPolicy};

/// Configuration exactly as deserialized from `Buildstamp.toml`.
///
/// ```toml
/// [config]
/// hash_workers = 4
///
/// [default]
/// exclude = ["**/__pycache__/**"]
///
/// [source.rag]
/// path = "src/handlers/rag"
/// include = ["**/*.py", "Dockerfile"]
/// append_default_exclude = true
///
/// [artifact.rag-image]
/// source = "rag"
/// prefix = "rag-"
///
/// [export.values]
/// CHUNK_SIZE = 1000
/// RAG_IMAGE_TAG = { tag = "rag-image" }
/// ```
///
/// Every section is optional at parse time; validation decides what is
/// actually required.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub default: DefaultSection,

    /// `[source.<name>]` tables.
    #[serde(default)]
    pub source: BTreeMap<String, SourceConfig>,

    /// `[artifact.<name>]` tables.
    #[serde(default)]
    pub artifact: BTreeMap<String, ArtifactConfig>,

    #[serde(default)]
    pub export: ExportSection,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Number of blocking workers used for hashing. `1` hashes sequentially.
    #[serde(default = "default_hash_workers")]
    pub hash_workers: usize,

    /// Policy for artifacts that do not set their own.
    #[serde(default)]
    pub tag_policy: TagPolicy,
}

fn default_hash_workers() -> usize {
    1
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            hash_workers: default_hash_workers(),
            tag_policy: TagPolicy::default(),
        }
    }
}

/// `[default]` section: pattern lists and digest mode inherited by sources.
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultSection {
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub digest: Option<DigestMode>,
}

fn default_include() -> Vec<String> {
    vec!["**".to_string()]
}

impl Default for DefaultSection {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: Vec::new(),
            digest: None,
        }
    }
}

/// `[source.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Directory to fingerprint, relative to the config file.
    pub path: PathBuf,

    /// If `None`, the source uses `default.include`.
    #[serde(default)]
    pub include: Option<Vec<String>>,

    /// If `None`, the source uses `default.exclude`.
    #[serde(default)]
    pub exclude: Option<Vec<String>>,

    /// Append `default.include` to `include` instead of replacing it.
    #[serde(default)]
    pub append_default_include: bool,

    /// Append `default.exclude` to `exclude` instead of replacing it.
    #[serde(default)]
    pub append_default_exclude: bool,

    #[serde(default)]
    pub digest: Option<DigestMode>,

    /// Fail with `EmptySet` instead of hashing an empty tree.
    #[serde(default)]
    pub require_files: bool,
}

impl SourceConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            include: None,
            exclude: None,
            append_default_include: false,
            append_default_exclude: false,
            digest: None,
            require_files: false,
        }
    }

    pub fn effective_include(&self, defaults: &DefaultSection) -> Vec<String> {
        effective_patterns(self.include.as_ref(), &defaults.include, self.append_default_include)
    }

    pub fn effective_exclude(&self, defaults: &DefaultSection) -> Vec<String> {
        effective_patterns(self.exclude.as_ref(), &defaults.exclude, self.append_default_exclude)
    }

    pub fn effective_digest(&self, defaults: &DefaultSection) -> DigestMode {
        self.digest.or(defaults.digest).unwrap_or_default()
    }
}

/// `[artifact.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactConfig {
    /// Name of the `[source.<name>]` the artifact is built from.
    pub source: String,

    #[serde(default)]
    pub prefix: String,

    /// Overrides `config.tag_policy`.
    #[serde(default)]
    pub policy: Option<TagPolicy>,

    /// Mutable alias reported next to the tag, e.g. `"latest"`.
    #[serde(default)]
    pub alias: Option<String>,
}

/// `[export]` section.
///
/// When the section is present, `required` defaults to the runtime key set;
/// when it is absent nothing is required.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ExportSection {
    #[serde(default = "default_required")]
    pub required: Vec<String>,

    #[serde(default)]
    pub values: BTreeMap<String, ValueSpec>,
}

fn default_required() -> Vec<String> {
    RUNTIME_KEYS.iter().map(|k| k.to_string()).collect()
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`), so
/// every reference inside it points at something that exists.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    default: DefaultSection,
    source: BTreeMap<String, SourceConfig>,
    artifact: BTreeMap<String, ArtifactConfig>,
    export: ExportSection,
    base_dir: PathBuf,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            default: raw.default,
            source: raw.source,
            artifact: raw.artifact,
            export: raw.export,
            base_dir: PathBuf::from("."),
        }
    }

    /// Directory that source paths are relative to.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = dir.into();
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config_section(&self) -> &ConfigSection {
        &self.config
    }

    pub fn default_section(&self) -> &DefaultSection {
        &self.default
    }

    pub fn sources(&self) -> &BTreeMap<String, SourceConfig> {
        &self.source
    }

    pub fn artifacts(&self) -> &BTreeMap<String, ArtifactConfig> {
        &self.artifact
    }

    pub fn export(&self) -> &ExportSection {
        &self.export
    }

    /// The effective tree for one source.
    pub fn source_tree(&self, name: &str) -> Result<SourceTree> {
        let src = self
            .source
            .get(name)
            .ok_or_else(|| BuildstampError::ConfigError(format!("unknown source '{name}'")))?;
        Ok(self.build_tree(name, src))
    }

    /// Effective trees for all sources, in name order.
    pub fn source_trees(&self) -> Vec<SourceTree> {
        self.source
            .iter()
            .map(|(name, src)| self.build_tree(name, src))
            .collect()
    }

    fn build_tree(&self, name: &str, src: &SourceConfig) -> SourceTree {
        SourceTree::new(name, self.base_dir.join(&src.path))
            .with_include(src.effective_include(&self.default))
            .with_exclude(src.effective_exclude(&self.default))
            .with_digest(src.effective_digest(&self.default))
            .with_require_files(src.require_files)
    }

    pub fn artifact_spec(&self, name: &str) -> Result<ArtifactSpec> {
        let art = self
            .artifact
            .get(name)
            .ok_or_else(|| BuildstampError::ConfigError(format!("unknown artifact '{name}'")))?;
        Ok(self.build_artifact(name, art))
    }

    fn build_artifact(&self, name: &str, art: &ArtifactConfig) -> ArtifactSpec {
        ArtifactSpec {
            name: name.to_string(),
            source: art.source.clone(),
            prefix: art.prefix.clone(),
            policy: art.policy.unwrap_or(self.config.tag_policy),
            alias: art.alias.clone(),
        }
    }
}
