use std::{
    fmt::Debug,
    fs, io,
    path::{Path, PathBuf},
    time::UNIX_EPOCH,
};

/// File system operations needed by the repository.
///
/// All paths are absolute. Implementations must be safe to share between
/// threads.
pub trait FileProvider: Send + Sync + Debug {
    /// Direct children of `dir`, files and directories alike. A missing
    /// directory yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` exists but cannot be listed
    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Whether `path` is a directory. Links to directories are not followed.
    fn is_directory(&self, path: &Path) -> bool;

    fn exists(&self, path: &Path) -> bool;

    /// # Errors
    ///
    /// Returns an error if the file is missing or not valid UTF-8
    fn read_file(&self, path: &Path) -> io::Result<String>;

    /// Create or replace the file at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    fn write_file(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Create `dir` and any missing parents
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created
    fn create_directory(&self, dir: &Path) -> io::Result<()>;

    /// # Errors
    ///
    /// Returns [`io::ErrorKind::NotFound`] if nothing exists at `path`
    fn delete(&self, path: &Path) -> io::Result<()>;

    /// Modification time in milliseconds since the epoch, or `0` when it
    /// cannot be read
    fn last_modified(&self, path: &Path) -> i64;
}

/// [`FileProvider`] backed by `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileProvider;

impl FileProvider for StdFileProvider {
    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        let mut paths = entries
            .map(|entry| entry.map(|e| e.path()))
            .collect::<io::Result<Vec<_>>>()?;
        paths.sort();
        Ok(paths)
    }

    fn is_directory(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok_and(|meta| meta.is_dir())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_file(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write_file(&self, path: &Path, content: &str) -> io::Result<()> {
        fs::write(path, content)
    }

    fn create_directory(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        if self.is_directory(path) {
            fs::remove_dir(path)
        } else {
            fs::remove_file(path)
        }
    }

    fn last_modified(&self, path: &Path) -> i64 {
        fs::metadata(path)
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .and_then(|age| i64::try_from(age.as_millis()).ok())
            .unwrap_or(0)
    }
}
