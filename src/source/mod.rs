// src/source/mod.rs

//! Source trees and include/exclude resolution.
//!
//! A [`SourceTree`] names a directory plus ordered include and exclude glob
//! lists. Resolving it yields a [`FileSet`]: the sorted, de-duplicated
//! relative paths that the hasher will read.

pub mod path_utils;
pub mod patterns;
pub mod resolver;

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::types::DigestMode;

pub use patterns::{CompiledPattern, PatternList, effective_patterns};
pub use resolver::{list_candidates, resolve, resolve_candidates};

/// A tracked source directory and its filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTree {
    pub name: String,
    pub root: PathBuf,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub digest: DigestMode,
    /// Treat an empty file set as an error instead of hashing to the sentinel.
    pub require_files: bool,
}

impl SourceTree {
    /// A tree that includes everything under `root`.
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            include: vec!["**".to_string()],
            exclude: Vec::new(),
            digest: DigestMode::Content,
            require_files: false,
        }
    }

    pub fn with_include<S: Into<String>>(mut self, patterns: impl IntoIterator<Item = S>) -> Self {
        self.include = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exclude<S: Into<String>>(mut self, patterns: impl IntoIterator<Item = S>) -> Self {
        self.exclude = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_digest(mut self, digest: DigestMode) -> Self {
        self.digest = digest;
        self
    }

    pub fn with_require_files(mut self, require: bool) -> Self {
        self.require_files = require;
        self
    }
}

/// Sorted set of paths relative to a source root, `/`-separated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    paths: Vec<String>,
}

impl FileSet {
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, rel_path: &str) -> bool {
        self.paths.binary_search_by(|p| p.as_str().cmp(rel_path)).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}

impl From<BTreeSet<String>> for FileSet {
    fn from(set: BTreeSet<String>) -> Self {
        // BTreeSet iterates in byte-lexicographic order.
        Self {
            paths: set.into_iter().collect(),
        }
    }
}

impl FromIterator<String> for FileSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        iter.into_iter().collect::<BTreeSet<_>>().into()
    }
}
