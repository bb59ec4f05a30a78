//! `UniFFI` bindings for the notes repository
//!
//! Exposes the repository as a single thread-safe object plus a few codec
//! helpers for Kotlin and Swift hosts.

use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::Utc;

use crate::{
    config::RepositoryConfig,
    error::EvryError,
    formats::evry::{self, EvryFormat},
    models::{EditableNote, Note, NoteType},
    repo::{EvryRepository, NotesRepository, SubscriptionId},
};

/// Receives the full note list after every change
#[uniffi::export(callback_interface)]
pub trait NotesObserver: Send + Sync {
    fn on_notes_changed(&self, notes: Vec<Note>);
}

/// A notes folder on the local file system
#[derive(Debug, uniffi::Object)]
pub struct EvryNotes {
    repo: Mutex<EvryRepository>,
}

impl EvryNotes {
    fn repo(&self) -> MutexGuard<'_, EvryRepository> {
        self.repo.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[uniffi::export]
impl EvryNotes {
    /// Open the notes folder at `root`; an empty string selects the default
    /// location
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    #[uniffi::constructor]
    pub fn new(root: &str) -> Result<Arc<Self>, EvryError> {
        let config = if root.trim().is_empty() {
            RepositoryConfig::from_env()
        } else {
            RepositoryConfig::with_root(root)
        };
        let repo = EvryRepository::open(config)?;
        Ok(Arc::new(Self {
            repo: Mutex::new(repo),
        }))
    }

    #[must_use]
    pub fn root(&self) -> String {
        self.repo().root().display().to_string()
    }

    /// Rescan the folder and return the number of notes found
    ///
    /// # Errors
    ///
    /// Returns an error if the folder cannot be listed
    pub fn refresh_notes(&self) -> Result<u64, EvryError> {
        let count = self.repo().refresh_notes()?;
        Ok(count as u64)
    }

    /// # Errors
    ///
    /// Returns an error if the note is empty or cannot be written
    pub fn create_note(&self, note: EditableNote) -> Result<String, EvryError> {
        let path = self.repo().create_note(&note)?;
        Ok(path.display().to_string())
    }

    /// # Errors
    ///
    /// Returns an error if the note is empty or cannot be written
    pub fn update_note(&self, note: EditableNote) -> Result<String, EvryError> {
        let path = self.repo().update_note(&note)?;
        Ok(path.display().to_string())
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be deleted
    pub fn delete_note(&self, path: &str) -> Result<(), EvryError> {
        Ok(self.repo().delete_note(Path::new(path))?)
    }

    /// Read a note for editing
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn get_note(&self, path: &str) -> Result<EditableNote, EvryError> {
        Ok(self.repo().get_note(Path::new(path))?)
    }

    /// Flip the archived flag, returning the new value
    ///
    /// # Errors
    ///
    /// Returns an error if the note cannot be read or written
    pub fn toggle_archived(&self, path: &str) -> Result<bool, EvryError> {
        Ok(self.repo().toggle_archived(Path::new(path))?)
    }

    pub fn notes(&self) -> Vec<Note> {
        self.repo().notes().to_vec()
    }

    pub fn get_note_by_id(&self, id: &str) -> Option<Note> {
        self.repo().get_note_by_id(id)
    }

    pub fn get_notes_by_type(&self, note_type: NoteType) -> Vec<Note> {
        self.repo().get_notes_by_type(note_type)
    }

    pub fn get_notes_by_tag(&self, tag: &str) -> Vec<Note> {
        self.repo().get_notes_by_tag(tag)
    }

    pub fn search_notes(&self, query: &str) -> Vec<Note> {
        self.repo().search_notes(query)
    }

    pub fn archived_notes(&self) -> Vec<Note> {
        self.repo().archived_notes()
    }

    pub fn active_notes(&self) -> Vec<Note> {
        self.repo().active_notes()
    }

    pub fn located_notes(&self) -> Vec<Note> {
        self.repo().located_notes()
    }

    pub fn all_tags(&self) -> Vec<String> {
        self.repo().all_tags()
    }

    pub fn clear_cache(&self) {
        self.repo().clear_cache();
    }

    pub fn revision(&self) -> u64 {
        self.repo().revision()
    }

    /// Register `observer`. It runs while this object is locked and must not
    /// call back into it.
    pub fn subscribe(&self, observer: Box<dyn NotesObserver>) -> u64 {
        let id = self
            .repo()
            .subscribe(move |notes| observer.on_notes_changed(notes.to_vec()));
        id.0
    }

    pub fn unsubscribe(&self, id: u64) -> bool {
        self.repo().unsubscribe(SubscriptionId(id))
    }
}

/// Decode note text as if read from `file_path`
///
/// # Errors
///
/// Returns an error if `type` or `created` is missing
#[uniffi::export]
pub fn parse_note_text(content: &str, file_path: &str) -> Result<Note, EvryError> {
    Ok(EvryFormat.parse_note(content, file_path)?)
}

#[uniffi::export]
#[must_use]
pub fn serialize_editable_note(note: EditableNote) -> String {
    EvryFormat.serialize_note(&note)
}

/// File name a new note with `title` would get right now
#[uniffi::export]
#[must_use]
pub fn note_file_name(title: &str) -> String {
    evry::note_file_name(title, Utc::now())
}
