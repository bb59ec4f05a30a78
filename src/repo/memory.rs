use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    io,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use crate::repo::file::FileProvider;

const FIRST_TICK: i64 = 1_000;

#[derive(Debug, Clone)]
struct MemoryFile {
    content: String,
    modified: i64,
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<PathBuf, MemoryFile>,
    dirs: BTreeSet<PathBuf>,
    clock: i64,
    reads: HashMap<PathBuf, usize>,
    denied: BTreeSet<PathBuf>,
}

impl State {
    fn tick(&mut self) -> i64 {
        self.clock = self.clock.max(FIRST_TICK) + 1;
        self.clock
    }

    fn register_parents(&mut self, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }
}

/// In-memory [`FileProvider`].
///
/// Modification times come from a logical clock that advances on every
/// write, so a rewrite is always seen as newer. Also records reads per path
/// and can be told to refuse listing a directory.
#[derive(Debug, Default)]
pub struct MemoryFileProvider {
    state: Mutex<State>,
}

impl MemoryFileProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of successful [`FileProvider::read_file`] calls for `path`
    #[must_use]
    pub fn read_count(&self, path: &Path) -> usize {
        self.state().reads.get(path).copied().unwrap_or(0)
    }

    /// Advance the modification time of an existing file
    pub fn touch(&self, path: &Path) {
        let mut state = self.state();
        let now = state.tick();
        if let Some(file) = state.files.get_mut(path) {
            file.modified = now;
        }
    }

    /// Force a modification time, e.g. to move a file into the past
    pub fn set_modified(&self, path: &Path, modified: i64) {
        if let Some(file) = self.state().files.get_mut(path) {
            file.modified = modified;
        }
    }

    /// Make listing `dir` fail with `PermissionDenied`
    pub fn deny_directory(&self, dir: &Path) {
        self.state().denied.insert(dir.to_path_buf());
    }
}

impl FileProvider for MemoryFileProvider {
    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let state = self.state();
        if state.denied.contains(dir) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("cannot list {}", dir.display()),
            ));
        }
        let children = state
            .dirs
            .iter()
            .chain(state.files.keys())
            .filter(|path| path.parent() == Some(dir))
            .cloned()
            .collect::<BTreeSet<_>>();
        Ok(children.into_iter().collect())
    }

    fn is_directory(&self, path: &Path) -> bool {
        self.state().dirs.contains(path)
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.state();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn read_file(&self, path: &Path) -> io::Result<String> {
        let mut state = self.state();
        let content = state
            .files
            .get(path)
            .map(|file| file.content.clone())
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        *state.reads.entry(path.to_path_buf()).or_default() += 1;
        Ok(content)
    }

    fn write_file(&self, path: &Path, content: &str) -> io::Result<()> {
        let mut state = self.state();
        if state.dirs.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{} is a directory", path.display()),
            ));
        }
        let modified = state.tick();
        state.register_parents(path);
        state.files.insert(
            path.to_path_buf(),
            MemoryFile {
                content: content.to_string(),
                modified,
            },
        );
        Ok(())
    }

    fn create_directory(&self, dir: &Path) -> io::Result<()> {
        let mut state = self.state();
        state.register_parents(dir);
        state.dirs.insert(dir.to_path_buf());
        Ok(())
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state();
        if state.files.remove(path).is_some() || state.dirs.remove(path) {
            Ok(())
        } else {
            Err(io::Error::from(io::ErrorKind::NotFound))
        }
    }

    fn last_modified(&self, path: &Path) -> i64 {
        self.state().files.get(path).map_or(0, |file| file.modified)
    }
}
