// src/export/value.rs

use std::fmt;

use serde::{Deserialize, Serialize};

/// A concrete exported value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

/// How one export key obtains its value.
///
/// In TOML:
///
/// ```toml
/// [export.values]
/// CHUNK_SIZE = 1000                                # literal
/// PG_VECTOR_DB_HOST = { output = "database.endpoint" }
/// INGESTION_SOURCE_HASH = { fingerprint = "ingestion" }
/// RAG_IMAGE_TAG = { tag = "rag-image" }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ValueSpec {
    /// Another resource's output, looked up in the outputs file.
    Output { output: String },
    Fingerprint { fingerprint: String },
    Tag { tag: String },
    Literal(Value),
}

impl ValueSpec {
    pub fn output(reference: impl Into<String>) -> Self {
        ValueSpec::Output {
            output: reference.into(),
        }
    }

    pub fn fingerprint(source: impl Into<String>) -> Self {
        ValueSpec::Fingerprint {
            fingerprint: source.into(),
        }
    }

    pub fn tag(artifact: impl Into<String>) -> Self {
        ValueSpec::Tag {
            tag: artifact.into(),
        }
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        ValueSpec::Literal(value.into())
    }
}
