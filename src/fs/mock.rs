// src/fs/mock.rs

use super::FileSystem;
use anyhow::{Result, anyhow};
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    /// Child names in insertion order.
    Dir(Vec<String>),
    Symlink(PathBuf),
    /// Listed by its parent but fails on open.
    Unreadable,
}

/// Order in which `read_dir` yields a directory's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingOrder {
    #[default]
    Insertion,
    Reversed,
}

#[derive(Debug, Default)]
struct MockState {
    entries: BTreeMap<PathBuf, MockEntry>,
    listing: ListingOrder,
    unlistable: Vec<PathBuf>,
}

/// In-memory filesystem for resolver and hasher tests.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listing_order(self, order: ListingOrder) -> Self {
        self.lock().listing = order;
        self
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut state = self.lock();
        ensure_dir(&mut state.entries, path.as_ref());
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.insert(path.as_ref(), MockEntry::File(content.into()));
    }

    pub fn add_symlink(&self, path: impl AsRef<Path>, target: impl Into<PathBuf>) {
        self.insert(path.as_ref(), MockEntry::Symlink(target.into()));
    }

    pub fn add_unreadable(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), MockEntry::Unreadable);
    }

    /// Make `read_dir` fail for this directory.
    pub fn deny_listing(&self, path: impl AsRef<Path>) {
        self.lock().unlistable.push(path.as_ref().to_path_buf());
    }

    /// Drop a file's content while leaving it listed in its parent, as if it
    /// was deleted between listing and reading.
    pub fn remove_content(&self, path: impl AsRef<Path>) {
        self.lock().entries.remove(path.as_ref());
    }

    fn insert(&self, path: &Path, entry: MockEntry) {
        let mut state = self.lock();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                ensure_dir(&mut state.entries, parent);
                link_child(&mut state.entries, parent, path);
            }
        }
        state.entries.insert(path.to_path_buf(), entry);
    }
}

fn ensure_dir(entries: &mut BTreeMap<PathBuf, MockEntry>, path: &Path) {
    if entries.contains_key(path) {
        return;
    }
    entries.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && parent != path {
            ensure_dir(entries, parent);
            link_child(entries, parent, path);
        }
    }
}

fn link_child(entries: &mut BTreeMap<PathBuf, MockEntry>, parent: &Path, child: &Path) {
    let Some(name) = child.file_name().and_then(|n| n.to_str()) else {
        return;
    };
    if let Some(MockEntry::Dir(children)) = entries.get_mut(parent) {
        if !children.iter().any(|c| c == name) {
            children.push(name.to_string());
        }
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let mut reader = self.open_read(path)?;
        let mut s = String::new();
        reader
            .read_to_string(&mut s)
            .map_err(|e| anyhow!("Invalid UTF-8 in {:?}: {}", path, e))?;
        Ok(s)
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let state = self.lock();
        match state.entries.get(path) {
            Some(MockEntry::File(content)) => Ok(Box::new(Cursor::new(content.clone()))),
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            Some(MockEntry::Symlink(_)) => Err(anyhow!("Symlinks are not followed: {:?}", path)),
            Some(MockEntry::Unreadable) => Err(anyhow!("Permission denied: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().entries.contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(
            self.lock().entries.get(path),
            Some(MockEntry::File(_)) | Some(MockEntry::Unreadable)
        )
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock().entries.get(path), Some(MockEntry::Dir(_)))
    }

    fn is_symlink(&self, path: &Path) -> bool {
        matches!(self.lock().entries.get(path), Some(MockEntry::Symlink(_)))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        // Tests use absolute paths throughout.
        Ok(path.to_path_buf())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let state = self.lock();
        if state.unlistable.iter().any(|p| p == path) {
            return Err(anyhow!("Permission denied listing {:?}", path));
        }
        match state.entries.get(path) {
            Some(MockEntry::Dir(children)) => {
                let mut out: Vec<PathBuf> = children.iter().map(|name| path.join(name)).collect();
                if state.listing == ListingOrder::Reversed {
                    out.reverse();
                }
                Ok(out)
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
