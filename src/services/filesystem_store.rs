//! Filesystem-backed `RunStore`.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::domain::AppError;
use crate::ports::{RunStore, StoreEntry};

/// Filesystem store rooted at a directory.
///
/// A confined store (used by the MCP server for its data directory) rejects
/// any path that escapes the root after logical normalization. An open store
/// (used by the CLI) resolves relative paths against the root and accepts
/// absolute paths as given.
#[derive(Debug, Clone)]
pub struct FilesystemStore {
    root: PathBuf,
    confined: bool,
}

impl FilesystemStore {
    /// Create an open store for the given root directory.
    pub fn new(root: PathBuf) -> Self {
        Self { root, confined: false }
    }

    /// Create a store that refuses paths outside `root`.
    pub fn confined(root: PathBuf) -> Self {
        Self { root, confined: true }
    }

    fn checked_path(&self, path: &Path) -> Result<PathBuf, AppError> {
        let full_path = self.resolve_path(path);
        if self.confined {
            self.validate_path_within_root(&full_path)?;
        }
        Ok(full_path)
    }

    /// Validates that a path (after logical normalization) is within the root.
    pub(crate) fn validate_path_within_root(&self, path: &Path) -> Result<(), AppError> {
        let full_path = if path.is_absolute() { path.to_path_buf() } else { self.root.join(path) };

        let normalized_path = normalize_path(&full_path);
        let normalized_root = normalize_path(&self.root);

        if !normalized_path.starts_with(&normalized_root) {
            return Err(AppError::PathTraversal(path.display().to_string()));
        }

        Ok(())
    }
}

impl RunStore for FilesystemStore {
    fn read_file(&self, path: &Path) -> Result<String, AppError> {
        let full_path = self.checked_path(path)?;
        fs::read_to_string(full_path).map_err(AppError::from)
    }

    fn write_bytes(&self, path: &Path, content: &[u8]) -> Result<(), AppError> {
        let full_path = self.checked_path(path)?;
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(full_path, content).map_err(AppError::from)
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.checked_path(path).map(|p| p.exists()).unwrap_or(false)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.checked_path(path).map(|p| p.is_dir()).unwrap_or(false)
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<StoreEntry>, AppError> {
        let full_path = self.checked_path(path)?;
        let mut entries = Vec::new();
        for entry in fs::read_dir(full_path)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            entries.push(StoreEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                is_dir: metadata.is_dir(),
                size: if metadata.is_file() { Some(metadata.len()) } else { None },
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

/// Normalize path by resolving `.` and `..` components logically.
/// This does not access the filesystem.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut components = path.components().peekable();
    let mut ret = if let Some(Component::RootDir) = components.peek() {
        components.next();
        PathBuf::from("/")
    } else {
        PathBuf::new()
    };

    for component in components {
        match component {
            Component::Prefix(..) | Component::RootDir => {
                ret.push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                ret.pop();
            }
            Component::Normal(c) => {
                ret.push(c);
            }
        }
    }
    ret
}
