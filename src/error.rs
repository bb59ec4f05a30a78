//! Error types for the evrynote library
//!
//! Each layer owns a `thiserror` enum; [`EvryError`] unifies them at the FFI
//! boundary.

use std::{io, path::Path};

use thiserror::Error;

/// Errors raised while decoding a note file
#[derive(Debug, Error)]
pub enum ParseError {
    /// `type` or `created` is absent from the common section
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    /// Any decoding failure, wrapped with the file it came from
    #[error("Failed to parse {path}: {source}")]
    Failed {
        path: String,
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    /// Create a missing required field error
    pub fn missing_field(name: impl Into<String>) -> Self {
        Self::MissingRequiredField(name.into())
    }

    /// Wrap `cause` with the path of the file being parsed
    pub fn failed(path: impl Into<String>, cause: Self) -> Self {
        Self::Failed {
            path: path.into(),
            source: Box::new(cause),
        }
    }

    /// Name of the missing required field, looking through any wrapping
    #[must_use]
    pub fn missing_field_name(&self) -> Option<&str> {
        match self {
            Self::MissingRequiredField(name) => Some(name.as_str()),
            Self::Failed { source, .. } => source.missing_field_name(),
        }
    }

    /// File path attached to this error, if any
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::MissingRequiredField(_) => None,
            Self::Failed { path, .. } => Some(path.as_str()),
        }
    }
}

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Save-time rejection of a note with nothing worth persisting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Note must have a title or content")]
    EmptyNote,

    #[error("Todo list must have a title or items")]
    EmptyTodo,

    #[error("Location note must have a name, address, or notes")]
    EmptyLocation,
}

/// Repository-related errors
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A file-system operation failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A note file could not be decoded
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The note was rejected before any I/O
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A path that cannot name a note file
    #[error("Invalid note path: {0}")]
    InvalidPath(String),

    /// Unusable repository configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RepositoryError {
    /// Create an I/O error for `path`
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: impl AsRef<Path>) -> Self {
        Self::InvalidPath(path.as_ref().display().to_string())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    #[must_use]
    pub const fn is_io_failure(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Whether the underlying I/O failure was a missing file
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }

    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                "Note no longer exists".to_string()
            }
            Self::Io { source, .. } => format!("File error: {source}"),
            Self::Parse(e) => match e.missing_field_name() {
                Some(field) => format!("Note file is missing its {field} field"),
                None => "Note file could not be read".to_string(),
            },
            Self::Validation(e) => e.to_string(),
            Self::InvalidPath(path) => format!("Not a note file: {path}"),
            Self::InvalidConfig(reason) => format!("Notes folder is not usable: {reason}"),
        }
    }
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Main unified error type that can represent any evrynote error
#[derive(Debug, Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum EvryError {
    /// Parsing error
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Validation error
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Repository error
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Generic error with custom message
    #[error("{0}")]
    Other(String),
}

impl EvryError {
    /// Create a generic error
    pub fn other(reason: impl Into<String>) -> Self {
        Self::Other(reason.into())
    }
}

/// Result type for evrynote operations
pub type EvryResult<T> = Result<T, EvryError>;
