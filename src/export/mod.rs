// src/export/mod.rs

//! Assembly of the configuration bundle handed to the deployed services.
//!
//! Each declared key maps to a [`ValueSpec`]; assembly resolves every spec to
//! a concrete [`Value`] or fails. There is no partial bundle.

pub mod outputs;
pub mod render;
pub mod value;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::errors::{BuildstampError, Result};
use crate::fingerprint::Fingerprint;
use crate::tag::ArtifactTag;

pub use outputs::{OutputSource, load_outputs};
pub use render::render_bundle;
pub use value::{Value, ValueSpec};

/// Keys the ingestion handler and the serving application read at startup.
pub const RUNTIME_KEYS: &[&str] = &[
    "PG_VECTOR_DB_HOST",
    "PG_VECTOR_PORT",
    "PG_VECTOR_DB_NAME",
    "PG_VECTOR_SECRET_ARN",
    "CHUNK_SIZE",
    "CHUNK_OVERLAP",
    "VECTOR_DB_INDEX",
    "EMBEDDING_MODEL_ID",
    "S3_BUCKET_NAME",
];

static KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex"));

pub fn is_valid_key(key: &str) -> bool {
    KEY_RE.is_match(key)
}

/// Fully resolved key/value mapping, ordered by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigBundle {
    values: BTreeMap<String, Value>,
}

impl ConfigBundle {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, Value> {
        &self.values
    }
}

/// Everything a value spec may refer to.
pub struct ExportInputs<'a> {
    pub outputs: &'a dyn OutputSource,
    pub fingerprints: &'a BTreeMap<String, Fingerprint>,
    pub tags: &'a BTreeMap<String, ArtifactTag>,
}

/// Resolve every declared value.
///
/// Fails with `UnresolvedReference` on the first key (in key order) whose
/// reference has no value; every missing reference is logged first.
pub fn assemble(values: &BTreeMap<String, ValueSpec>, inputs: &ExportInputs<'_>) -> Result<ConfigBundle> {
    let mut resolved = BTreeMap::new();
    let mut first_missing: Option<BuildstampError> = None;

    for (key, spec) in values {
        match resolve_one(spec, inputs) {
            Some(v) => {
                resolved.insert(key.clone(), v);
            }
            None => {
                let reference = describe(spec);
                warn!(key = %key, reference = %reference, "unresolved export reference");
                if first_missing.is_none() {
                    first_missing = Some(BuildstampError::UnresolvedReference {
                        key: key.clone(),
                        reference,
                    });
                }
            }
        }
    }

    if let Some(err) = first_missing {
        return Err(err);
    }

    debug!(keys = resolved.len(), "assembled config bundle");
    Ok(ConfigBundle { values: resolved })
}

fn resolve_one(spec: &ValueSpec, inputs: &ExportInputs<'_>) -> Option<Value> {
    match spec {
        ValueSpec::Literal(v) => Some(v.clone()),
        ValueSpec::Output { output } => inputs.outputs.lookup(output),
        ValueSpec::Fingerprint { fingerprint } => inputs
            .fingerprints
            .get(fingerprint)
            .map(|fp| Value::Text(fp.to_string())),
        ValueSpec::Tag { tag } => inputs.tags.get(tag).map(|t| Value::Text(t.tag.clone())),
    }
}

fn describe(spec: &ValueSpec) -> String {
    match spec {
        ValueSpec::Literal(v) => v.to_string(),
        ValueSpec::Output { output } => format!("output:{output}"),
        ValueSpec::Fingerprint { fingerprint } => format!("fingerprint:{fingerprint}"),
        ValueSpec::Tag { tag } => format!("tag:{tag}"),
    }
}
