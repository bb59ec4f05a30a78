use std::{
    collections::{HashSet, VecDeque},
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};

use super::{
    NotesRepository,
    cache::NoteCache,
    file::{FileProvider, StdFileProvider},
    view::{NotesView, Observers, SubscriptionId},
};
use crate::{
    config::RepositoryConfig,
    error::{RepositoryError, RepositoryResult},
    formats::{NoteSerialization, evry},
    models::{EditableNote, Note},
};

fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Note repository over a directory tree of `.evry` files.
///
/// Holds the parsed-note cache and the published note list. Every change to
/// either goes through this type.
#[derive(Debug)]
pub struct EvryRepository {
    config: RepositoryConfig,
    provider: Arc<dyn FileProvider>,
    format: Arc<dyn NoteSerialization>,
    cache: NoteCache,
    view: NotesView,
    observers: Observers,
}

impl EvryRepository {
    #[must_use]
    pub fn new(
        config: RepositoryConfig,
        provider: Arc<dyn FileProvider>,
        format: Arc<dyn NoteSerialization>,
    ) -> Self {
        Self {
            config,
            provider,
            format,
            cache: NoteCache::new(),
            view: NotesView::new(),
            observers: Observers::default(),
        }
    }

    /// Repository using the Evry codec over `provider`
    #[must_use]
    pub fn with_provider(config: RepositoryConfig, provider: Arc<dyn FileProvider>) -> Self {
        Self::new(config, provider, Arc::new(evry::EvryFormat))
    }

    /// Repository on the local file system.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid
    pub fn open(config: RepositoryConfig) -> RepositoryResult<Self> {
        config.validate()?;
        Ok(Self::with_provider(config, Arc::new(StdFileProvider)))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    #[must_use]
    pub const fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Shared read handle on the note list
    #[must_use]
    pub fn view(&self) -> NotesView {
        self.view.clone()
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.view.revision()
    }

    /// Run `callback` with the full list after every change
    pub fn subscribe(
        &mut self,
        callback: impl Fn(&[Note]) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.observers.add(Box::new(callback))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.remove(id)
    }

    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn cached_paths(&self) -> Vec<String> {
        self.cache.paths()
    }

    /// Flip the archived flag of the note at `path`, returning the new value
    ///
    /// # Errors
    ///
    /// Returns an error if the note cannot be read or written back
    pub fn toggle_archived(&mut self, path: &Path) -> RepositoryResult<bool> {
        let mut note = self.get_note(path)?;
        note.archived = !note.archived;
        self.update_note(&note)?;
        Ok(note.archived)
    }

    /// Breadth-first walk collecting note files. Only a failure to list the
    /// root is an error.
    fn collect_note_files(&self) -> RepositoryResult<Vec<PathBuf>> {
        let root = self.config.root.as_path();
        let mut files = Vec::new();
        let mut pending = VecDeque::from([root.to_path_buf()]);

        while let Some(dir) = pending.pop_front() {
            let entries = match self.provider.list_files(&dir) {
                Ok(entries) => entries,
                Err(source) if dir == root => return Err(RepositoryError::io(&dir, source)),
                Err(err) => {
                    warn!("Skipping directory {}: {err}", dir.display());
                    continue;
                }
            };
            for entry in entries {
                if self.provider.is_directory(&entry) {
                    pending.push_back(entry);
                } else if self.config.is_note_file(&entry) {
                    files.push(entry);
                }
            }
        }

        Ok(files)
    }

    /// A path in the root for a new note that does not exist yet
    pub(crate) fn unique_note_path(&self, title: &str, now: DateTime<Utc>) -> PathBuf {
        let candidate = |suffix: Option<u32>| {
            self.config
                .root
                .join(evry::note_file_name_with_suffix(title, now, suffix))
                .with_extension(&self.config.extension)
        };
        let first = candidate(None);
        if !self.provider.exists(&first) {
            return first;
        }
        (2..=u32::MAX)
            .map(|n| candidate(Some(n)))
            .find(|path| !self.provider.exists(path))
            .unwrap_or(first)
    }

    fn read_and_parse(&self, path: &Path) -> RepositoryResult<Note> {
        let content = self
            .provider
            .read_file(path)
            .map_err(|source| RepositoryError::io(path, source))?;
        Ok(self.format.parse(&content, &path_key(path))?)
    }

    fn write_note(&self, path: &Path, note: &EditableNote) -> RepositoryResult<()> {
        self.provider
            .write_file(path, &self.format.serialize(note))
            .map_err(|source| RepositoryError::io(path, source))
    }

    /// Load one path into the cache and list, replacing any entry for it
    fn refresh_single_note(&mut self, path: &Path) -> RepositoryResult<Note> {
        let note = self.load_and_parse_file(path)?;
        let mut notes = self.view.snapshot().to_vec();
        match notes.iter_mut().find(|n| n.file_path == note.file_path) {
            Some(existing) => existing.clone_from(&note),
            None => notes.push(note.clone()),
        }
        self.publish(notes);
        Ok(note)
    }

    fn publish(&mut self, notes: Vec<Note>) {
        let notes: Arc<[Note]> = notes.into();
        let revision = self.view.publish(Arc::clone(&notes));
        debug!("Published {} notes (revision {revision})", notes.len());
        self.observers.notify(&notes);
    }

    fn write_new_note(&mut self, note: &EditableNote) -> RepositoryResult<PathBuf> {
        let root = self.config.root.clone();
        self.provider
            .create_directory(&root)
            .map_err(|source| RepositoryError::io(&root, source))?;

        let now = Utc::now();
        let path = self.unique_note_path(&note.title, now);
        let mut note = note.clone();
        if note.created.trim().is_empty() {
            note.created = evry::timestamp(now);
        }
        note.file_path = path_key(&path);

        self.write_note(&path, &note)?;
        self.refresh_single_note(&path)?;
        Ok(path)
    }

    fn write_existing_note(&mut self, note: &EditableNote) -> RepositoryResult<PathBuf> {
        if note.is_new() {
            return Err(RepositoryError::invalid_path(&note.file_path));
        }
        let path = PathBuf::from(&note.file_path);
        let mut note = note.clone();
        note.edited = evry::timestamp(Utc::now());

        self.write_note(&path, &note)?;
        self.cache.invalidate(&note.file_path);
        self.refresh_single_note(&path)?;
        Ok(path)
    }
}

impl NotesRepository for EvryRepository {
    fn refresh_notes(&mut self) -> RepositoryResult<usize> {
        info!("Scanning notes in {}", self.config.root.display());
        let files = self.collect_note_files().inspect_err(|err| {
            error!("Failed to scan notes: {err}");
        })?;

        let mut notes = Vec::with_capacity(files.len());
        for path in &files {
            match self.load_and_parse_file(path) {
                Ok(note) => notes.push(note),
                Err(err) => warn!("Skipping {}: {err}", path.display()),
            }
        }

        let seen: HashSet<String> = files.iter().map(|path| path_key(path)).collect();
        self.cache.retain(|path| seen.contains(path));

        let count = notes.len();
        self.publish(notes);
        info!("Loaded {count} of {} note files", files.len());
        Ok(count)
    }

    fn load_and_parse_file(&mut self, path: &Path) -> RepositoryResult<Note> {
        let key = path_key(path);
        let modified = self.provider.last_modified(path);
        if let Some(note) = self.cache.fresh(&key, modified) {
            return Ok(note.clone());
        }

        debug!("Parsing {key}");
        let note = self.read_and_parse(path)?;
        self.cache.insert(key, note.clone(), modified);
        Ok(note)
    }

    fn create_note(&mut self, note: &EditableNote) -> RepositoryResult<PathBuf> {
        note.validate()?;
        self.write_new_note(note).inspect_err(|err| {
            error!("Failed to create note: {err}");
        })
    }

    fn update_note(&mut self, note: &EditableNote) -> RepositoryResult<PathBuf> {
        note.validate()?;
        self.write_existing_note(note).inspect_err(|err| {
            error!("Failed to update note {}: {err}", note.file_path);
        })
    }

    fn delete_note(&mut self, path: &Path) -> RepositoryResult<()> {
        self.provider
            .delete(path)
            .map_err(|source| RepositoryError::io(path, source))
            .inspect_err(|err| error!("Failed to delete note: {err}"))?;

        let key = path_key(path);
        self.cache.invalidate(&key);
        let notes = self
            .view
            .snapshot()
            .iter()
            .filter(|note| note.file_path != key)
            .cloned()
            .collect();
        self.publish(notes);
        Ok(())
    }

    fn get_note(&self, path: &Path) -> RepositoryResult<EditableNote> {
        self.read_and_parse(path).map(|note| EditableNote::from(&note))
    }

    fn clear_cache(&mut self) {
        debug!("Clearing {} cached notes", self.cache.len());
        self.cache.clear();
    }

    fn notes(&self) -> Arc<[Note]> {
        self.view.snapshot()
    }
}
