use std::fmt::Debug;

use crate::{
    error::ParseResult,
    models::{EditableNote, Note},
};

pub mod evry;
pub mod fields;

/// Text codec between note files and typed notes
pub trait NoteSerialization: Send + Sync + Debug {
    /// Decode the full text of the file at `file_path`
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is missing
    fn parse(&self, content: &str, file_path: &str) -> ParseResult<Note>;

    /// Encode a note for writing
    fn serialize(&self, note: &EditableNote) -> String;
}
