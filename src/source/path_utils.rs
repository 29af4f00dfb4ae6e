// src/source/path_utils.rs

//! Path helpers shared by the tree walker and the watcher.

use std::path::{Component, Path};

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Tries a plain `strip_prefix(root)` first, then retries with both paths
/// canonicalized (macOS reports `/private/var/...` for `/var/...`).
///
/// Returns `None` if the path is not under `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash_lossy(rel));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(to_slash_lossy(rel));
        }
    }

    None
}

/// Join the normal components of a relative path with `/`.
///
/// `.` components are dropped so `./src/a.py` and `src/a.py` compare equal.
/// Returns `None` if any component is not valid UTF-8.
pub fn to_slash(rel: &Path) -> Option<String> {
    let parts = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_str()),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

/// Like [`to_slash`], but replaces invalid UTF-8. Only for matching event
/// paths, never for reopening files.
fn to_slash_lossy(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
