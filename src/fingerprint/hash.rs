// src/fingerprint/hash.rs

use std::io::Read;
use std::path::Path;

use blake3::Hasher;
use tracing::{debug, trace};

use crate::errors::{BuildstampError, Result};
use crate::fingerprint::Fingerprint;
use crate::fs::FileSystem;
use crate::source::FileSet;
use crate::types::DigestMode;

/// Digest of one file under `root`, as lowercase hex.
///
/// In `PathAndContent` mode the relative path and a NUL separator are hashed
/// ahead of the bytes.
pub fn compute_file_digest(
    fs: &dyn FileSystem,
    root: &Path,
    rel_path: &str,
    mode: DigestMode,
) -> Result<String> {
    let path = root.join(rel_path);
    let access = |reason: String| BuildstampError::AccessError {
        path: path.clone(),
        reason,
    };

    let mut hasher = Hasher::new();
    if mode == DigestMode::PathAndContent {
        hasher.update(rel_path.as_bytes());
        hasher.update(&[0u8]);
    }

    let mut file = fs.open_read(&path).map_err(|e| access(format!("{e:#}")))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf).map_err(|e| access(e.to_string()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    let digest = hasher.finalize().to_hex().to_string();
    trace!(file = %rel_path, digest = %digest, "hashed file");
    Ok(digest)
}

/// Aggregate per-file digests into a fingerprint.
///
/// `digests` must already be in file-set order.
pub fn compute_aggregate<S: AsRef<str>>(digests: &[S]) -> Fingerprint {
    let mut hasher = Hasher::new();
    for d in digests {
        hasher.update(d.as_ref().as_bytes());
    }
    Fingerprint::from_hash(hasher.finalize())
}

/// Fingerprint of an empty file set.
pub fn empty_fingerprint() -> Fingerprint {
    compute_aggregate::<&str>(&[])
}

/// Sequentially hash every file of `set` and aggregate in set order.
pub fn hash_file_set(
    fs: &dyn FileSystem,
    root: &Path,
    set: &FileSet,
    mode: DigestMode,
) -> Result<Fingerprint> {
    let digests = set
        .iter()
        .map(|rel| compute_file_digest(fs, root, rel, mode))
        .collect::<Result<Vec<_>>>()?;

    let fingerprint = compute_aggregate(&digests);
    debug!(files = set.len(), fingerprint = %fingerprint, "computed aggregate hash");
    Ok(fingerprint)
}
