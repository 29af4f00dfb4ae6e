// src/source/patterns.rs

use std::collections::BTreeSet;
use std::fmt;

use globset::{GlobBuilder, GlobMatcher};

use crate::errors::{BuildstampError, Result};

/// A single compiled glob, keeping its source text for logs and errors.
#[derive(Clone)]
pub struct CompiledPattern {
    text: String,
    matcher: GlobMatcher,
}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CompiledPattern").field(&self.text).finish()
    }
}

impl CompiledPattern {
    /// Compile one pattern. `*` and `?` never cross a `/`; `**` spans any
    /// number of components, including none.
    pub fn new(text: &str) -> Result<Self> {
        let glob = GlobBuilder::new(text)
            .literal_separator(true)
            .backslash_escape(true)
            .build()
            .map_err(|e| BuildstampError::InvalidPattern {
                pattern: text.to_string(),
                reason: e.kind().to_string(),
            })?;
        Ok(Self {
            text: text.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_match(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
    }

    /// The subset of `candidates` this pattern selects.
    pub fn expand<'a, I>(&self, candidates: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        candidates
            .into_iter()
            .filter(|c| self.is_match(c))
            .cloned()
            .collect()
    }
}

/// An ordered list of compiled patterns (one include or exclude list).
#[derive(Debug, Clone, Default)]
pub struct PatternList {
    patterns: Vec<CompiledPattern>,
}

impl PatternList {
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| CompiledPattern::new(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledPattern> {
        self.patterns.iter()
    }

    /// Union of every pattern's expansion over `candidates`.
    pub fn expand_union(&self, candidates: &BTreeSet<String>) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for pattern in &self.patterns {
            out.extend(pattern.expand(candidates));
        }
        out
    }

    pub fn matches_any(&self, rel_path: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(rel_path))
    }
}

/// Decide the effective list for one dimension (include or exclude).
///
/// - task list + `append_default = true`: task list followed by defaults
/// - task list only: task list replaces defaults
/// - no task list: defaults
pub fn effective_patterns(
    own: Option<&Vec<String>>,
    defaults: &[String],
    append_default: bool,
) -> Vec<String> {
    match (own, append_default) {
        (Some(list), true) => {
            let mut combined = list.clone();
            combined.extend(defaults.iter().cloned());
            combined
        }
        (Some(list), false) => list.clone(),
        (None, _) => defaults.to_vec(),
    }
}
