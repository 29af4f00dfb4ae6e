// src/fingerprint/store.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info};

use crate::errors::{BuildstampError, Result};
use crate::fingerprint::Fingerprint;
use crate::fs::FileSystem;

/// Read access to previously recorded fingerprints.
///
/// Recording is the deployment state store's job; buildstamp only reads what
/// it is handed. `MemoryStampStore` also accepts records so watch mode can
/// track the last fingerprint it reported.
pub trait StampStore: Send + Sync {
    fn load(&self, source: &str) -> Result<Option<Fingerprint>>;
}

/// Stamps kept in memory for the life of the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStampStore {
    map: BTreeMap<String, Fingerprint>,
}

impl MemoryStampStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fingerprint, returning the one it replaced.
    pub fn record(&mut self, source: &str, fingerprint: Fingerprint) -> Option<Fingerprint> {
        let previous = self.map.insert(source.to_string(), fingerprint);
        debug!(source = %source, replaced = previous.is_some(), "recorded stamp (memory)");
        previous
    }
}

impl StampStore for MemoryStampStore {
    fn load(&self, source: &str) -> Result<Option<Fingerprint>> {
        Ok(self.map.get(source).cloned())
    }
}

/// Stamps read once from a TOML file of `name = "<fingerprint>"` pairs.
///
/// A missing file means nothing has been deployed yet.
#[derive(Debug, Clone)]
pub struct FileStampStore {
    path: PathBuf,
    map: BTreeMap<String, Fingerprint>,
}

impl FileStampStore {
    pub fn open(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !fs.exists(&path) {
            info!(path = ?path, "no previous stamp file; every source counts as new");
            return Ok(Self {
                path,
                map: BTreeMap::new(),
            });
        }

        let contents = fs
            .read_to_string(&path)
            .with_context(|| format!("reading stamp file {:?}", path))?;
        let raw: BTreeMap<String, String> = toml::from_str(&contents)?;

        let mut map = BTreeMap::new();
        for (name, value) in raw {
            let fp = Fingerprint::parse(&value).ok_or_else(|| {
                BuildstampError::ConfigError(format!(
                    "stamp file {:?}: entry '{}' is not a fingerprint: {}",
                    path, name, value
                ))
            })?;
            map.insert(name, fp);
        }

        debug!(path = ?path, entries = map.len(), "loaded stamp file");
        Ok(Self { path, map })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StampStore for FileStampStore {
    fn load(&self, source: &str) -> Result<Option<Fingerprint>> {
        Ok(self.map.get(source).cloned())
    }
}

/// Render stamps in the format `FileStampStore` reads.
pub fn render_stamps<'a, I>(stamps: I) -> Result<String>
where
    I: IntoIterator<Item = (&'a str, &'a Fingerprint)>,
{
    let table: BTreeMap<&str, &str> = stamps
        .into_iter()
        .map(|(name, fp)| (name, fp.as_str()))
        .collect();
    toml::to_string(&table).map_err(|e| BuildstampError::Other(e.into()))
}
