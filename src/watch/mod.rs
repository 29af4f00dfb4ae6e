// src/watch/mod.rs

//! Watch mode: re-fingerprint sources as their files change.
//!
//! This module only reports fingerprint transitions. Deciding what to rebuild
//! stays with whoever consumes the events.

pub mod event_handler;
pub mod watcher;

use crate::fingerprint::Fingerprint;

pub use event_handler::{WatchedTree, affected_trees, refresh_tree};
pub use watcher::{WatcherHandle, spawn_watcher};

/// A source whose fingerprint moved (or was computed for the first time).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub source: String,
    pub previous: Option<Fingerprint>,
    pub current: Fingerprint,
    pub files: usize,
}
