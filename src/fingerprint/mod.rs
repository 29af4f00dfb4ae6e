// src/fingerprint/mod.rs

//! Content fingerprints of source trees and rebuild decisions.
//!
//! A fingerprint is a two-level BLAKE3 digest: one digest per file of the
//! resolved [`FileSet`](crate::source::FileSet), then one digest over the
//! per-file hex digests concatenated in set order.

pub mod hash;
pub mod parallel;
pub mod plan;
pub mod store;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::errors::{BuildstampError, Result};
use crate::fs::FileSystem;
use crate::source::{FileSet, SourceTree, resolve};

pub use hash::{compute_aggregate, compute_file_digest, empty_fingerprint, hash_file_set};
pub use parallel::hash_file_set_parallel;
pub use plan::{PlanEntry, RebuildDecision, plan_rebuilds};
pub use store::{FileStampStore, MemoryStampStore, StampStore, render_stamps};

/// Length of the short form used in content-derived tags.
pub const SHORT_LEN: usize = 12;

/// 64-character lowercase hex BLAKE3 digest of a source tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub(crate) fn from_hash(hash: blake3::Hash) -> Self {
        Self(hash.to_hex().to_string())
    }

    /// Parse a stored fingerprint; anything but 64 hex digits is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit()) {
            Some(Self(s.to_ascii_lowercase()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        &self.0[..SHORT_LEN]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A resolved tree together with its fingerprint.
#[derive(Debug, Clone)]
pub struct TreeStamp {
    pub name: String,
    pub files: FileSet,
    pub fingerprint: Fingerprint,
}

/// Resolve and hash one tree sequentially.
pub fn fingerprint_tree(fs: &dyn FileSystem, tree: &SourceTree) -> Result<TreeStamp> {
    let files = resolve_non_empty(fs, tree)?;
    let fingerprint = hash_file_set(fs, &tree.root, &files, tree.digest)?;
    info!(source = %tree.name, files = files.len(), fingerprint = %fingerprint, "fingerprinted source");
    Ok(TreeStamp {
        name: tree.name.clone(),
        files,
        fingerprint,
    })
}

/// Resolve one tree, then hash it on up to `workers` threads.
pub async fn fingerprint_tree_parallel(
    fs: Arc<dyn FileSystem>,
    tree: &SourceTree,
    workers: usize,
) -> Result<TreeStamp> {
    let files = resolve_non_empty(fs.as_ref(), tree)?;
    let root: PathBuf = tree.root.clone();
    let fingerprint = hash_file_set_parallel(fs, root, &files, tree.digest, workers).await?;
    info!(source = %tree.name, files = files.len(), fingerprint = %fingerprint, "fingerprinted source");
    Ok(TreeStamp {
        name: tree.name.clone(),
        files,
        fingerprint,
    })
}

fn resolve_non_empty(fs: &dyn FileSystem, tree: &SourceTree) -> Result<FileSet> {
    let files = resolve(fs, tree)?;
    if files.is_empty() && tree.require_files {
        return Err(BuildstampError::EmptySet(tree.name.clone()));
    }
    Ok(files)
}
