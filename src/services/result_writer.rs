//! Writes one result file per row.

use std::path::{Path, PathBuf};

use crate::domain::{OutputEncoding, RowError};
use crate::ports::RunStore;

/// Strategy for writing returned text to disk.
#[derive(Debug, Clone, Copy)]
pub struct ResultWriter {
    pub encoding: OutputEncoding,
    /// Write UTF-8 when `encoding` cannot represent the text.
    pub fallback: bool,
}

/// A file the writer produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Written {
    pub path: PathBuf,
    pub fallback_used: bool,
}

impl ResultWriter {
    pub fn new(encoding: OutputEncoding, fallback: bool) -> Self {
        Self { encoding, fallback }
    }

    /// Write `text` to `dir/file_name`.
    ///
    /// The primary path writes the text in the configured encoding. When that
    /// fails on an unrepresentable character and fallback is enabled, the text
    /// is transcoded to UTF-8 instead; otherwise the row fails with
    /// `RowError::Encoding` and nothing is written.
    pub fn write(
        &self,
        store: &impl RunStore,
        dir: &Path,
        file_name: &str,
        text: &str,
    ) -> Result<Written, RowError> {
        let path = dir.join(file_name);

        let (bytes, fallback_used) = match self.encoding.encode(text) {
            Ok(bytes) => (bytes, false),
            Err(err) if self.fallback => {
                tracing::warn!(file = %path.display(), error = %err, "Falling back to UTF-8");
                (OutputEncoding::Utf8.encode(text).map_err(RowError::from)?, true)
            }
            Err(err) => return Err(err.into()),
        };

        store.write_bytes(&path, &bytes).map_err(|e| RowError::Write(e.to_string()))?;
        Ok(Written { path: store.resolve_path(&path), fallback_used })
    }
}
