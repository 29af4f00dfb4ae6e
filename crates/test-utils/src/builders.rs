#![allow(dead_code)]

use std::path::PathBuf;

use buildstamp::config::{
    ArtifactConfig, ConfigFile, ExportSection, RawConfigFile, SourceConfig,
};
use buildstamp::export::ValueSpec;
use buildstamp::types::{DigestMode, TagPolicy};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts with no `[export]` section, so nothing is required until
/// `with_required` or `with_value` is used.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
    base_dir: Option<PathBuf>,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
            base_dir: None,
        }
    }

    pub fn with_source(mut self, name: &str, source: SourceConfig) -> Self {
        self.config.source.insert(name.to_string(), source);
        self
    }

    pub fn with_artifact(mut self, name: &str, artifact: ArtifactConfig) -> Self {
        self.config.artifact.insert(name.to_string(), artifact);
        self
    }

    pub fn with_default_include(mut self, patterns: &[&str]) -> Self {
        self.config.default.include = patterns.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_default_exclude(mut self, pattern: &str) -> Self {
        self.config.default.exclude.push(pattern.to_string());
        self
    }

    pub fn with_default_digest(mut self, digest: DigestMode) -> Self {
        self.config.default.digest = Some(digest);
        self
    }

    pub fn with_hash_workers(mut self, workers: usize) -> Self {
        self.config.config.hash_workers = workers;
        self
    }

    pub fn with_tag_policy(mut self, policy: TagPolicy) -> Self {
        self.config.config.tag_policy = policy;
        self
    }

    pub fn with_value(mut self, key: &str, spec: ValueSpec) -> Self {
        self.config.export.values.insert(key.to_string(), spec);
        self
    }

    pub fn with_required(mut self, keys: &[&str]) -> Self {
        self.config.export.required = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn with_export(mut self, export: ExportSection) -> Self {
        self.config.export = export;
        self
    }

    /// Directory that relative source paths are joined onto.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        let base_dir = self.base_dir;
        let cfg = ConfigFile::try_from(self.config)
            .expect("Failed to build valid config from builder");
        match base_dir {
            Some(dir) => cfg.with_base_dir(dir),
            None => cfg,
        }
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `SourceConfig`.
pub struct SourceConfigBuilder {
    source: SourceConfig,
}

impl SourceConfigBuilder {
    pub fn new(path: &str) -> Self {
        Self {
            source: SourceConfig::new(path),
        }
    }

    pub fn include(mut self, pattern: &str) -> Self {
        self.source
            .include
            .get_or_insert_with(Vec::new)
            .push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.source
            .exclude
            .get_or_insert_with(Vec::new)
            .push(pattern.to_string());
        self
    }

    pub fn append_default_include(mut self, val: bool) -> Self {
        self.source.append_default_include = val;
        self
    }

    pub fn append_default_exclude(mut self, val: bool) -> Self {
        self.source.append_default_exclude = val;
        self
    }

    pub fn digest(mut self, digest: DigestMode) -> Self {
        self.source.digest = Some(digest);
        self
    }

    pub fn require_files(mut self, val: bool) -> Self {
        self.source.require_files = val;
        self
    }

    pub fn build(self) -> SourceConfig {
        self.source
    }
}

/// Builder for `ArtifactConfig`.
pub struct ArtifactConfigBuilder {
    artifact: ArtifactConfig,
}

impl ArtifactConfigBuilder {
    pub fn new(source: &str) -> Self {
        Self {
            artifact: ArtifactConfig {
                source: source.to_string(),
                prefix: String::new(),
                policy: None,
                alias: None,
            },
        }
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.artifact.prefix = prefix.to_string();
        self
    }

    pub fn policy(mut self, policy: TagPolicy) -> Self {
        self.artifact.policy = Some(policy);
        self
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.artifact.alias = Some(alias.to_string());
        self
    }

    pub fn build(self) -> ArtifactConfig {
        self.artifact
    }
}
