// src/export/outputs.rs

//! Resolved outputs of other resources (database endpoint, secret ARN,
//! bucket name, ...) as handed over by the deployment orchestrator.
//!
//! Nested tables/objects are flattened into dotted keys, so
//! `{"database": {"endpoint": "db.internal"}}` answers `database.endpoint`.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use tracing::debug;

use crate::errors::{BuildstampError, Result};
use crate::export::value::Value;
use crate::fs::FileSystem;

pub trait OutputSource {
    fn lookup(&self, reference: &str) -> Option<Value>;
}

impl OutputSource for BTreeMap<String, Value> {
    fn lookup(&self, reference: &str) -> Option<Value> {
        self.get(reference).cloned()
    }
}

/// Load an outputs file. `.json` files are parsed as JSON, anything else as
/// TOML.
pub fn load_outputs(fs: &dyn FileSystem, path: &Path) -> Result<BTreeMap<String, Value>> {
    let contents = fs
        .read_to_string(path)
        .with_context(|| format!("reading outputs file {:?}", path))?;

    let mut out = BTreeMap::new();
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        let root: serde_json::Value = serde_json::from_str(&contents)
            .with_context(|| format!("parsing outputs file {:?}", path))?;
        flatten_json("", &root, &mut out)?;
    } else {
        let root: toml::Table = toml::from_str(&contents)?;
        for (k, v) in &root {
            flatten_toml(k, v, &mut out)?;
        }
    }

    debug!(path = ?path, outputs = out.len(), "loaded resource outputs");
    Ok(out)
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn flatten_toml(key: &str, value: &toml::Value, out: &mut BTreeMap<String, Value>) -> Result<()> {
    let v = match value {
        toml::Value::Table(table) => {
            for (k, v) in table {
                flatten_toml(&join_key(key, k), v, out)?;
            }
            return Ok(());
        }
        toml::Value::String(s) => Value::Text(s.clone()),
        toml::Value::Integer(i) => Value::Integer(*i),
        toml::Value::Float(f) => Value::Float(*f),
        toml::Value::Boolean(b) => Value::Text(b.to_string()),
        toml::Value::Datetime(d) => Value::Text(d.to_string()),
        toml::Value::Array(_) => return Err(unsupported(key)),
    };
    out.insert(key.to_string(), v);
    Ok(())
}

fn flatten_json(key: &str, value: &serde_json::Value, out: &mut BTreeMap<String, Value>) -> Result<()> {
    let v = match value {
        serde_json::Value::Object(map) => {
            for (k, v) in map {
                flatten_json(&join_key(key, k), v, out)?;
            }
            return Ok(());
        }
        serde_json::Value::String(s) => Value::Text(s.clone()),
        serde_json::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Value::Integer(i),
            (None, Some(f)) => Value::Float(f),
            _ => return Err(unsupported(key)),
        },
        serde_json::Value::Bool(b) => Value::Text(b.to_string()),
        // A null output has not been produced yet; leave it unresolved.
        serde_json::Value::Null => return Ok(()),
        serde_json::Value::Array(_) => return Err(unsupported(key)),
    };
    out.insert(key.to_string(), v);
    Ok(())
}

fn unsupported(key: &str) -> BuildstampError {
    BuildstampError::ConfigError(format!(
        "output '{key}' is a list; only strings and numbers can be exported"
    ))
}
