//! In-memory `RunStore` for unit tests.

use std::collections::{BTreeSet, HashMap};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::domain::AppError;
use crate::ports::{RunStore, StoreEntry};

/// In-memory file map keyed by normalized relative path.
///
/// Clones share the same backing map, so a test can keep one handle to seed
/// and inspect files while production code owns another.
#[derive(Clone, Debug, Default)]
pub struct MemoryRunStore {
    files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
}

impl MemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.add(path, content);
        self
    }

    pub fn add(&self, path: &str, content: &str) {
        self.files.lock().unwrap().insert(key(Path::new(path)), content.as_bytes().to_vec());
    }

    /// Raw bytes of a stored file.
    pub fn bytes(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(&key(Path::new(path))).cloned()
    }

    /// Stored file as text.
    pub fn text(&self, path: &str) -> Option<String> {
        self.bytes(path).map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Every stored path, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.files.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }
}

fn key(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::ParentDir => {
                out.pop();
            }
            _ => {}
        }
    }
    out
}

impl RunStore for MemoryRunStore {
    fn read_file(&self, path: &Path) -> Result<String, AppError> {
        let bytes = self.bytes(&path.to_string_lossy()).ok_or_else(|| {
            AppError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            ))
        })?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::ParseError { what: path.display().to_string(), details: e.to_string() })
    }

    fn write_bytes(&self, path: &Path, content: &[u8]) -> Result<(), AppError> {
        self.files.lock().unwrap().insert(key(path), content.to_vec());
        Ok(())
    }

    fn file_exists(&self, path: &Path) -> bool {
        let wanted = key(path);
        self.files.lock().unwrap().keys().any(|p| p.starts_with(&wanted))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let wanted = key(path);
        self.files.lock().unwrap().keys().any(|p| p != &wanted && p.starts_with(&wanted))
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<StoreEntry>, AppError> {
        let dir = key(path);
        let files = self.files.lock().unwrap();
        let mut names = BTreeSet::new();
        for (file, content) in files.iter() {
            let Ok(rest) = file.strip_prefix(&dir) else { continue };
            let mut parts = rest.components();
            let Some(first) = parts.next() else { continue };
            let name = first.as_os_str().to_string_lossy().into_owned();
            let is_dir = parts.next().is_some();
            let size = if is_dir { None } else { Some(content.len() as u64) };
            names.insert((name, is_dir, size));
        }
        Ok(names.into_iter().map(|(name, is_dir, size)| StoreEntry { name, is_dir, size }).collect())
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        key(path)
    }
}
