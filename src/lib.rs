#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

uniffi::setup_scaffolding!();

pub mod config;
pub mod error;
pub mod ffi;
pub mod formats;
pub mod models;
pub mod repo;

// Re-export common types for convenience
pub use config::RepositoryConfig;
pub use error::{
    EvryError, EvryResult, ParseError, ParseResult, RepositoryError, RepositoryResult,
    ValidationError,
};
pub use formats::{NoteSerialization, evry::EvryFormat};
pub use models::{EditableNote, Note, NoteType};
pub use repo::{EvryRepository, FileProvider, NotesRepository, NotesView, StdFileProvider};
