// src/watch/event_handler.rs

//! Turning filesystem change paths into fingerprint transitions.

use std::path::Path;

use tracing::{debug, warn};

use crate::errors::Result;
use crate::fingerprint::{MemoryStampStore, StampStore, fingerprint_tree};
use crate::fs::FileSystem;
use crate::source::path_utils::relative_str;
use crate::source::{PatternList, SourceTree};
use crate::watch::WatchEvent;

/// A tree plus its compiled exclude list, for cheap event filtering.
#[derive(Debug, Clone)]
pub struct WatchedTree {
    pub tree: SourceTree,
    exclude: PatternList,
}

impl WatchedTree {
    pub fn new(tree: SourceTree) -> Result<Self> {
        let exclude = PatternList::compile(&tree.exclude)?;
        Ok(Self { tree, exclude })
    }

    /// Whether a change at `path` could alter this tree's fingerprint.
    ///
    /// Paths outside the root, and paths an exclude pattern matches, cannot.
    pub fn is_affected_by(&self, path: &Path) -> bool {
        match relative_str(&self.tree.root, path) {
            Some(rel) if rel.is_empty() => true,
            Some(rel) => !self.exclude.matches_any(&rel),
            None => false,
        }
    }
}

/// Indices of the trees a change at `path` may affect.
pub fn affected_trees(trees: &[WatchedTree], path: &Path) -> Vec<usize> {
    trees
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_affected_by(path))
        .map(|(i, _)| i)
        .collect()
}

/// Re-fingerprint `tree` and report a transition if the value moved.
///
/// Failures are logged and swallowed: a file deleted mid-hash is normal
/// while an editor saves, and the next event will settle it.
pub fn refresh_tree(
    fs: &dyn FileSystem,
    tree: &SourceTree,
    store: &mut MemoryStampStore,
) -> Option<WatchEvent> {
    let stamp = match fingerprint_tree(fs, tree) {
        Ok(stamp) => stamp,
        Err(err) => {
            warn!(source = %tree.name, error = %err, "failed to re-fingerprint source");
            return None;
        }
    };

    let previous = store.load(&tree.name).ok().flatten();
    if previous.as_ref() == Some(&stamp.fingerprint) {
        debug!(source = %tree.name, "fingerprint unchanged");
        return None;
    }

    store.record(&tree.name, stamp.fingerprint.clone());
    Some(WatchEvent {
        source: tree.name.clone(),
        previous,
        current: stamp.fingerprint,
        files: stamp.files.len(),
    })
}
