// src/watch/watcher.rs

use std::sync::Arc;

use anyhow::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::fingerprint::MemoryStampStore;
use crate::fs::{FileSystem, RealFileSystem};
use crate::source::SourceTree;
use crate::watch::WatchEvent;
use crate::watch::event_handler::{WatchedTree, affected_trees, refresh_tree};

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch every tree root recursively and send a [`WatchEvent`] whenever a
/// tree's fingerprint moves.
///
/// The current fingerprint of each tree is reported once at startup
/// (with `previous = None`).
pub fn spawn_watcher(
    trees: Vec<SourceTree>,
    events_tx: mpsc::Sender<WatchEvent>,
) -> Result<WatcherHandle> {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    let trees: Vec<SourceTree> = trees
        .into_iter()
        .map(|mut t| {
            // Canonicalize once so event paths relativize cleanly.
            if let Ok(root) = fs.canonicalize(&t.root) {
                t.root = root;
            }
            t
        })
        .collect();
    let watched = trees
        .into_iter()
        .map(WatchedTree::new)
        .collect::<crate::errors::Result<Vec<_>>>()?;
    let watched = Arc::new(watched);

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    warn!(error = %err, "failed to forward notify event");
                }
            }
            Err(err) => {
                warn!(error = %err, "file watch error");
            }
        },
        Config::default(),
    )?;

    for w in watched.iter() {
        watcher.watch(&w.tree.root, RecursiveMode::Recursive)?;
        info!(source = %w.tree.name, root = ?w.tree.root, "watching source");
    }

    tokio::spawn(async move {
        let mut store = MemoryStampStore::new();

        for w in watched.iter() {
            if let Some(ev) = refresh_tree(fs.as_ref(), &w.tree, &mut store) {
                if events_tx.send(ev).await.is_err() {
                    return;
                }
            }
        }

        while let Some(event) = event_rx.recv().await {
            if matches!(event.kind, EventKind::Access(_)) {
                continue;
            }
            debug!(?event, "received notify event");

            let mut dirty: Vec<usize> = event
                .paths
                .iter()
                .flat_map(|p| affected_trees(&watched, p))
                .collect();
            dirty.sort_unstable();
            dirty.dedup();

            for idx in dirty {
                if let Some(ev) = refresh_tree(fs.as_ref(), &watched[idx].tree, &mut store) {
                    if events_tx.send(ev).await.is_err() {
                        return;
                    }
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}
