use std::{
    env,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{RepositoryError, RepositoryResult};

/// Environment variable names
pub mod env_vars {
    /// Absolute path of the notes root; overrides the default location
    pub const NOTES_DIR: &str = "EVRY_NOTES_DIR";
}

/// Default values
pub mod defaults {
    pub const APP_DIR: &str = ".everything";
    pub const NOTES_DIR: &str = "notes";
    pub const EXTENSION: &str = "evry";
}

/// `~/.everything/notes`, or `./.everything/notes` without a home directory
#[must_use]
pub fn default_notes_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(defaults::APP_DIR)
        .join(defaults::NOTES_DIR)
}

/// Where the repository keeps its files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub root: PathBuf,
    /// Note file extension, without the dot
    pub extension: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            root: default_notes_dir(),
            extension: defaults::EXTENSION.to_string(),
        }
    }
}

impl RepositoryConfig {
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Defaults, with the root taken from [`env_vars::NOTES_DIR`] when set
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`RepositoryConfig::from_env`] with a custom variable source
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match lookup(env_vars::NOTES_DIR).filter(|dir| !dir.trim().is_empty()) {
            Some(dir) => Self::with_root(dir.trim()),
            None => Self::default(),
        }
    }

    /// # Errors
    ///
    /// Returns [`RepositoryError::InvalidConfig`] for an empty extension or
    /// one containing a dot prefix or a path separator
    pub fn validate(&self) -> RepositoryResult<()> {
        let ext = self.extension.as_str();
        if ext.is_empty() {
            return Err(RepositoryError::invalid_config("empty file extension"));
        }
        if ext.starts_with('.') {
            return Err(RepositoryError::invalid_config(format!(
                "file extension {ext:?} must not start with a dot"
            )));
        }
        if ext.contains(['/', '\\']) {
            return Err(RepositoryError::invalid_config(format!(
                "file extension {ext:?} contains a path separator"
            )));
        }
        if self.root.as_os_str().is_empty() {
            return Err(RepositoryError::invalid_config("empty notes root"));
        }
        Ok(())
    }

    /// Whether the file name of `path` ends in `.<extension>`. A bare
    /// `.evry` counts.
    #[must_use]
    pub fn is_note_file(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_suffix(self.extension.as_str()))
            .is_some_and(|stem| stem.ends_with('.'))
    }
}
