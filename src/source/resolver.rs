// src/source/resolver.rs

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, trace};

use crate::errors::{BuildstampError, Result};
use crate::fs::FileSystem;
use crate::source::path_utils::to_slash;
use crate::source::patterns::PatternList;
use crate::source::{FileSet, SourceTree};

/// Resolve a source tree against the filesystem.
///
/// Patterns are compiled before anything is read, so a malformed glob fails
/// with `InvalidPattern` even when the directory is missing.
pub fn resolve(fs: &dyn FileSystem, tree: &SourceTree) -> Result<FileSet> {
    let include = PatternList::compile(&tree.include)?;
    let exclude = PatternList::compile(&tree.exclude)?;

    let candidates = list_candidates(fs, &tree.root)?;
    let set = resolve_candidates(&candidates, &include, &exclude);

    debug!(
        source = %tree.name,
        candidates = candidates.len(),
        files = set.len(),
        "resolved source tree"
    );
    Ok(set)
}

/// Pure set algebra over candidate paths: `union(include) - union(exclude)`.
pub fn resolve_candidates(
    candidates: &BTreeSet<String>,
    include: &PatternList,
    exclude: &PatternList,
) -> FileSet {
    let included = include.expand_union(candidates);
    if exclude.is_empty() {
        return included.into();
    }
    let excluded = exclude.expand_union(candidates);
    included
        .difference(&excluded)
        .cloned()
        .collect::<BTreeSet<_>>()
        .into()
}

/// Every regular file under `root`, as `/`-separated relative paths.
///
/// `root` itself may be a symlink to a directory; symbolic links below it are
/// skipped, never followed. A file whose relative path is not valid UTF-8 is
/// `SourceUnavailable`, since it could neither be matched nor reopened.
pub fn list_candidates(fs: &dyn FileSystem, root: &Path) -> Result<BTreeSet<String>> {
    if !fs.exists(root) {
        return Err(unavailable(root, "directory does not exist"));
    }
    if !fs.is_dir(root) {
        return Err(unavailable(root, "not a directory"));
    }

    let mut files = BTreeSet::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = fs
            .read_dir(&dir)
            .map_err(|e| unavailable(&dir, &format!("{e:#}")))?;

        for path in entries {
            if fs.is_symlink(&path) {
                trace!(?path, "skipping symlink");
                continue;
            }
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                if let Ok(rel) = path.strip_prefix(root) {
                    let rel = to_slash(rel)
                        .ok_or_else(|| unavailable(&path, "file name is not valid UTF-8"))?;
                    files.insert(rel);
                }
            }
        }
    }

    Ok(files)
}

fn unavailable(path: &Path, reason: &str) -> BuildstampError {
    BuildstampError::SourceUnavailable {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
