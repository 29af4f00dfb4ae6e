// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{BuildstampError, Result};
use crate::export::{ValueSpec, is_valid_key};
use crate::source::PatternList;
use crate::tag::{is_valid_tag, validate_prefix};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = BuildstampError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_sources(cfg)?;
    validate_global_config(cfg)?;
    validate_source_patterns(cfg)?;
    validate_artifacts(cfg)?;
    validate_export(cfg)?;
    Ok(())
}

fn config_err(msg: String) -> BuildstampError {
    BuildstampError::ConfigError(msg)
}

fn ensure_has_sources(cfg: &RawConfigFile) -> Result<()> {
    if cfg.source.is_empty() {
        return Err(config_err(
            "config must contain at least one [source.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.hash_workers == 0 {
        return Err(config_err(
            "[config].hash_workers must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

/// Compile every effective pattern list so a bad glob fails at load time
/// with `InvalidPattern` rather than halfway through a run.
fn validate_source_patterns(cfg: &RawConfigFile) -> Result<()> {
    for (name, src) in cfg.source.iter() {
        if src.path.is_absolute() {
            return Err(config_err(format!(
                "source '{}' path must be relative to the config file (got {:?})",
                name, src.path
            )));
        }
        PatternList::compile(&src.effective_include(&cfg.default))?;
        PatternList::compile(&src.effective_exclude(&cfg.default))?;
    }
    Ok(())
}

fn validate_artifacts(cfg: &RawConfigFile) -> Result<()> {
    for (name, art) in cfg.artifact.iter() {
        if !cfg.source.contains_key(&art.source) {
            return Err(config_err(format!(
                "artifact '{}' refers to unknown source '{}'",
                name, art.source
            )));
        }
        validate_prefix(&art.prefix).map_err(|e| config_err(format!("artifact '{name}': {e}")))?;
        if let Some(alias) = &art.alias {
            if !is_valid_tag(alias) {
                return Err(config_err(format!(
                    "artifact '{}' alias `{}` is not a valid tag",
                    name, alias
                )));
            }
        }
    }
    Ok(())
}

fn validate_export(cfg: &RawConfigFile) -> Result<()> {
    let export = &cfg.export;

    for (key, spec) in export.values.iter() {
        if !is_valid_key(key) {
            return Err(config_err(format!(
                "export key '{}' must match [A-Za-z_][A-Za-z0-9_]*",
                key
            )));
        }
        match spec {
            ValueSpec::Fingerprint { fingerprint } if !cfg.source.contains_key(fingerprint) => {
                return Err(config_err(format!(
                    "export key '{}' refers to unknown source '{}'",
                    key, fingerprint
                )));
            }
            ValueSpec::Tag { tag } if !cfg.artifact.contains_key(tag) => {
                return Err(config_err(format!(
                    "export key '{}' refers to unknown artifact '{}'",
                    key, tag
                )));
            }
            ValueSpec::Output { output } if output.trim().is_empty() => {
                return Err(config_err(format!(
                    "export key '{}' has an empty output reference",
                    key
                )));
            }
            _ => {}
        }
    }

    let missing: Vec<&str> = export
        .required
        .iter()
        .filter(|k| !export.values.contains_key(k.as_str()))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(config_err(format!(
            "[export] is missing required keys: {}",
            missing.join(", ")
        )));
    }

    Ok(())
}
