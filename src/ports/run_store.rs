//! File operations over the run's working files.
//!
//! The store owns no workflow semantics: which file is the template or the
//! variable table is decided by `RunPaths` in the run configuration.

use std::path::{Path, PathBuf};

use crate::domain::AppError;

/// A directory entry returned by [`RunStore::list_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    /// Path relative to the listed directory.
    pub name: String,
    pub is_dir: bool,
    /// Size in bytes; `None` for directories.
    pub size: Option<u64>,
}

/// Port for reading and writing run files.
///
/// Relative paths resolve against the store root. Confined implementations
/// must reject paths that escape the root.
pub trait RunStore {
    /// Read a file as UTF-8 text.
    fn read_file(&self, path: &Path) -> Result<String, AppError>;

    /// Write UTF-8 content, creating parent directories as needed.
    fn write_file(&self, path: &Path, content: &str) -> Result<(), AppError> {
        self.write_bytes(path, content.as_bytes())
    }

    /// Write raw bytes, creating parent directories as needed.
    fn write_bytes(&self, path: &Path, content: &[u8]) -> Result<(), AppError>;

    /// Check whether a file or directory exists.
    fn file_exists(&self, path: &Path) -> bool;

    /// Check whether a path is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// List a directory, sorted by name.
    fn list_dir(&self, path: &Path) -> Result<Vec<StoreEntry>, AppError>;

    /// Resolve a path against the store root.
    fn resolve_path(&self, path: &Path) -> PathBuf;
}
