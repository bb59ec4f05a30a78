use std::{
    collections::HashSet,
    fmt::Debug,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    error::RepositoryResult,
    models::{EditableNote, Note, NoteType},
};

pub mod cache;
pub mod evry;
pub mod file;
pub mod memory;
pub mod view;

pub use cache::{CachedEntry, NoteCache};
pub use evry::EvryRepository;
pub use file::{FileProvider, StdFileProvider};
pub use memory::MemoryFileProvider;
pub use view::{NotesView, SubscriptionId};

/// A file-backed note collection.
///
/// Mutations take `&mut self`: one writer at a time. Queries only look at the
/// current list and never touch the disk.
pub trait NotesRepository: Send + Sync + Debug {
    /// Rebuild the note list from disk, returning how many notes were loaded
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be listed
    fn refresh_notes(&mut self) -> RepositoryResult<usize>;

    /// Decode one file, reusing the cached note while the file is unchanged
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    fn load_and_parse_file(&mut self, path: &Path) -> RepositoryResult<Note>;

    /// Write a new note file and add it to the list
    ///
    /// # Errors
    ///
    /// Returns an error if validation or writing fails
    fn create_note(&mut self, note: &EditableNote) -> RepositoryResult<PathBuf>;

    /// Overwrite an existing note file
    ///
    /// # Errors
    ///
    /// Returns an error if validation or writing fails
    fn update_note(&mut self, note: &EditableNote) -> RepositoryResult<PathBuf>;

    /// # Errors
    ///
    /// Returns an error if the file cannot be deleted
    fn delete_note(&mut self, path: &Path) -> RepositoryResult<()>;

    /// Fresh read of a note for editing
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    fn get_note(&self, path: &Path) -> RepositoryResult<EditableNote>;

    fn clear_cache(&mut self);

    /// Current note list, in discovery order
    fn notes(&self) -> Arc<[Note]>;

    fn get_note_by_id(&self, id: &str) -> Option<Note> {
        self.notes().iter().find(|note| note.id == id).cloned()
    }

    fn get_notes_by_type(&self, note_type: NoteType) -> Vec<Note> {
        filter_notes(&self.notes(), |note| note.note_type() == note_type)
    }

    /// Notes carrying `tag`, compared case-insensitively
    fn get_notes_by_tag(&self, tag: &str) -> Vec<Note> {
        filter_notes(&self.notes(), |note| note.has_tag(tag))
    }

    /// Case-insensitive substring search over title, content and tags
    fn search_notes(&self, query: &str) -> Vec<Note> {
        let needle = query.to_lowercase();
        filter_notes(&self.notes(), |note| note.matches_lowercase(&needle))
    }

    fn archived_notes(&self) -> Vec<Note> {
        filter_notes(&self.notes(), Note::is_archived)
    }

    fn active_notes(&self) -> Vec<Note> {
        filter_notes(&self.notes(), |note| !note.is_archived())
    }

    /// Location notes that can be placed on a map
    fn located_notes(&self) -> Vec<Note> {
        filter_notes(&self.notes(), |note| {
            note.as_location()
                .is_some_and(|place| place.coordinates.is_some())
        })
    }

    /// Distinct tags, first spelling wins, sorted ignoring case
    fn all_tags(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut tags: Vec<String> = self
            .notes()
            .iter()
            .flat_map(|note| note.common.tags.iter())
            .filter(|tag| seen.insert(tag.to_lowercase()))
            .cloned()
            .collect();
        tags.sort_by_cached_key(|tag| tag.to_lowercase());
        tags
    }
}

fn filter_notes(notes: &[Note], keep: impl Fn(&Note) -> bool) -> Vec<Note> {
    notes.iter().filter(|note| keep(note)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::RepositoryConfig, models::NoteType};

    fn titled(note_type: NoteType, title: &str) -> EditableNote {
        let mut note = EditableNote::new(note_type);
        note.title = title.to_string();
        note
    }

    fn exercise(repo: &mut dyn NotesRepository) {
        let path = repo.create_note(&titled(NoteType::Todo, "Chores")).unwrap();
        assert_eq!(repo.refresh_notes().unwrap(), 1);
        assert_eq!(repo.notes()[0].title(), "Chores");
        assert_eq!(repo.get_note(&path).unwrap().title, "Chores");

        repo.delete_note(&path).unwrap();
        assert!(repo.notes().is_empty());
    }

    #[test]
    fn repository_as_trait_object() {
        let provider = Arc::new(MemoryFileProvider::new());
        let mut repo =
            EvryRepository::with_provider(RepositoryConfig::with_root("/notes"), provider);
        exercise(&mut repo);
    }

    #[test]
    fn std_repository_basic_operations() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo =
            EvryRepository::open(RepositoryConfig::with_root(dir.path().join("notes"))).unwrap();
        exercise(&mut repo);
    }
}
