// src/pipeline.rs

//! End-to-end operations over a validated config: fingerprint sources, tag
//! artifacts, assemble the export bundle, plan rebuilds.
//!
//! Each operation computes only the fingerprints it needs.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::debug;

use crate::config::ConfigFile;
use crate::errors::Result;
use crate::export::{ConfigBundle, ExportInputs, OutputSource, ValueSpec, assemble};
use crate::fingerprint::{
    Fingerprint, PlanEntry, StampStore, TreeStamp, fingerprint_tree, fingerprint_tree_parallel,
    plan_rebuilds,
};
use crate::fs::FileSystem;
use crate::tag::{ArtifactTag, ArtifactTagger, Clock};
use crate::types::TagPolicy;

/// Fingerprint the named sources (all when `names` is empty), in name order.
pub async fn fingerprint_sources(
    cfg: &ConfigFile,
    fs: Arc<dyn FileSystem>,
    names: &[String],
) -> Result<Vec<TreeStamp>> {
    let wanted: BTreeSet<&str> = if names.is_empty() {
        cfg.sources().keys().map(String::as_str).collect()
    } else {
        names.iter().map(String::as_str).collect()
    };

    let workers = cfg.config_section().hash_workers;
    let mut stamps = Vec::with_capacity(wanted.len());

    for name in wanted {
        let tree = cfg.source_tree(name)?;
        let stamp = if workers > 1 {
            fingerprint_tree_parallel(Arc::clone(&fs), &tree, workers).await?
        } else {
            fingerprint_tree(fs.as_ref(), &tree)?
        };
        stamps.push(stamp);
    }

    Ok(stamps)
}

/// Tag one artifact, fingerprinting its source only under the content policy.
pub async fn tag_artifact<C: Clock>(
    cfg: &ConfigFile,
    fs: Arc<dyn FileSystem>,
    tagger: &ArtifactTagger<C>,
    name: &str,
) -> Result<ArtifactTag> {
    let spec = cfg.artifact_spec(name)?;
    let fingerprint = match spec.policy {
        TagPolicy::Content => {
            let stamps = fingerprint_sources(cfg, fs, std::slice::from_ref(&spec.source)).await?;
            stamps.into_iter().next().map(|s| s.fingerprint)
        }
        TagPolicy::Timestamp => None,
    };
    tagger.tag(&spec, fingerprint.as_ref())
}

/// Resolve `[export.values]` into a bundle.
///
/// Fingerprints are computed for sources referenced directly and for the
/// sources of content-tagged artifacts that are referenced.
pub async fn export_bundle<C: Clock>(
    cfg: &ConfigFile,
    fs: Arc<dyn FileSystem>,
    tagger: &ArtifactTagger<C>,
    outputs: &dyn OutputSource,
) -> Result<ConfigBundle> {
    let values = &cfg.export().values;

    let mut artifact_names = BTreeSet::new();
    let mut source_names = BTreeSet::new();
    for spec in values.values() {
        match spec {
            ValueSpec::Fingerprint { fingerprint } => {
                source_names.insert(fingerprint.clone());
            }
            ValueSpec::Tag { tag } => {
                artifact_names.insert(tag.clone());
            }
            _ => {}
        }
    }

    let specs = artifact_names
        .iter()
        .map(|name| cfg.artifact_spec(name))
        .collect::<Result<Vec<_>>>()?;
    for spec in &specs {
        if spec.policy == TagPolicy::Content {
            source_names.insert(spec.source.clone());
        }
    }

    let names: Vec<String> = source_names.into_iter().collect();
    let fingerprints: BTreeMap<String, Fingerprint> = if names.is_empty() {
        BTreeMap::new()
    } else {
        fingerprint_sources(cfg, fs, &names)
            .await?
            .into_iter()
            .map(|s| (s.name, s.fingerprint))
            .collect()
    };

    let mut tags = BTreeMap::new();
    for spec in &specs {
        let tag = tagger.tag(spec, fingerprints.get(&spec.source))?;
        tags.insert(spec.name.clone(), tag);
    }

    debug!(
        sources = fingerprints.len(),
        artifacts = tags.len(),
        "export inputs ready"
    );

    let inputs = ExportInputs {
        outputs,
        fingerprints: &fingerprints,
        tags: &tags,
    };
    assemble(values, &inputs)
}

/// Fingerprint every source and compare against `previous`.
pub async fn plan(
    cfg: &ConfigFile,
    fs: Arc<dyn FileSystem>,
    previous: &dyn StampStore,
) -> Result<Vec<PlanEntry>> {
    let stamps = fingerprint_sources(cfg, fs, &[]).await?;
    plan_rebuilds(&stamps, previous)
}
