// src/fingerprint/parallel.rs

//! Concurrent per-file hashing with order-independent aggregation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::task::JoinSet;
use tracing::debug;

use crate::errors::{BuildstampError, Result};
use crate::fingerprint::Fingerprint;
use crate::fingerprint::hash::{compute_aggregate, compute_file_digest};
use crate::fs::FileSystem;
use crate::source::FileSet;
use crate::types::DigestMode;

/// Hash `set` on up to `workers` blocking threads.
///
/// Each digest lands in the slot of its file's sorted position, and the
/// aggregate reads slots front to back, so completion order never reaches
/// the fingerprint. The first read failure aborts the remaining work.
pub async fn hash_file_set_parallel(
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    set: &FileSet,
    mode: DigestMode,
    workers: usize,
) -> Result<Fingerprint> {
    let workers = workers.max(1);
    let mut slots: Vec<Option<String>> = vec![None; set.len()];
    let mut pending = set.paths().iter().cloned().enumerate();
    let mut tasks: JoinSet<(usize, Result<String>)> = JoinSet::new();

    let spawn_next = |tasks: &mut JoinSet<(usize, Result<String>)>, next: Option<(usize, String)>| {
        if let Some((idx, rel)) = next {
            let fs = Arc::clone(&fs);
            let root = root.clone();
            tasks.spawn_blocking(move || {
                (idx, compute_file_digest(fs.as_ref(), &root, &rel, mode))
            });
        }
    };

    for _ in 0..workers {
        spawn_next(&mut tasks, pending.next());
    }

    while let Some(joined) = tasks.join_next().await {
        let (idx, digest) =
            joined.map_err(|e| BuildstampError::Other(anyhow!("hash worker failed: {e}")))?;
        match digest {
            Ok(d) => slots[idx] = Some(d),
            Err(err) => {
                tasks.abort_all();
                return Err(err);
            }
        }
        spawn_next(&mut tasks, pending.next());
    }

    let digests = slots
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| BuildstampError::Other(anyhow!("hash worker left a slot empty")))?;

    let fingerprint = compute_aggregate(&digests);
    debug!(files = set.len(), workers, fingerprint = %fingerprint, "computed aggregate hash (parallel)");
    Ok(fingerprint)
}
