use std::collections::HashMap;

use log::trace;

use crate::models::Note;

/// A decoded note and the modification time it was decoded at
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEntry {
    pub note: Note,
    pub last_modified: i64,
}

impl CachedEntry {
    /// Still valid for a file currently stamped `current`
    #[must_use]
    pub const fn is_fresh(&self, current: i64) -> bool {
        self.last_modified >= current
    }
}

/// Parsed notes keyed by absolute path
#[derive(Debug, Default)]
pub struct NoteCache {
    entries: HashMap<String, CachedEntry>,
}

impl NoteCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached note for `path` if it is at least as new as `current`
    #[must_use]
    pub fn fresh(&self, path: &str, current: i64) -> Option<&Note> {
        match self.entries.get(path) {
            Some(entry) if entry.is_fresh(current) => {
                trace!("cache hit for {path}");
                Some(&entry.note)
            }
            Some(_) => {
                trace!("cache stale for {path}");
                None
            }
            None => None,
        }
    }

    pub fn insert(&mut self, path: impl Into<String>, note: Note, last_modified: i64) {
        self.entries.insert(
            path.into(),
            CachedEntry {
                note,
                last_modified,
            },
        );
    }

    pub fn invalidate(&mut self, path: &str) -> Option<CachedEntry> {
        self.entries.remove(path)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop every entry whose path fails `keep`
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|path, _| keep(path));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached paths in sorted order
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.entries.keys().cloned().collect();
        paths.sort();
        paths
    }
}
