//! Batch manifest sidecar files under `<output_dir>/.batches/`.

use std::path::{Path, PathBuf};

use crate::domain::{AppError, BatchManifest};
use crate::ports::RunStore;

const MANIFEST_DIR: &str = ".batches";

/// Location of the manifest for `batch_id`, or `None` when the id is not a
/// plain file-name component.
pub fn manifest_path(output_dir: &Path, batch_id: &str) -> Option<PathBuf> {
    let safe = !batch_id.is_empty()
        && !batch_id.starts_with('.')
        && batch_id.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    safe.then(|| output_dir.join(MANIFEST_DIR).join(format!("{}.json", batch_id)))
}

/// Write the manifest; returns `false` without writing when the batch id is
/// not usable as a file name.
pub fn save(store: &impl RunStore, output_dir: &Path, manifest: &BatchManifest) -> Result<bool, AppError> {
    let Some(path) = manifest_path(output_dir, &manifest.batch_id) else {
        return Ok(false);
    };
    let content = serde_json::to_string_pretty(manifest)?;
    store.write_file(&path, &content)?;
    tracing::debug!(path = %path.display(), "Wrote batch manifest");
    Ok(true)
}

/// Load the manifest for `batch_id` if one was recorded.
///
/// An unreadable or malformed manifest is logged and ignored.
pub fn load(store: &impl RunStore, output_dir: &Path, batch_id: &str) -> Option<BatchManifest> {
    let path = manifest_path(output_dir, batch_id)?;
    if !store.file_exists(&path) {
        return None;
    }
    let parsed = store
        .read_file(&path)
        .and_then(|content| serde_json::from_str::<BatchManifest>(&content).map_err(AppError::from));
    match parsed {
        Ok(manifest) if manifest.batch_id == batch_id => Some(manifest),
        Ok(_) => {
            tracing::warn!(path = %path.display(), "Manifest belongs to another batch; ignoring it");
            None
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Ignoring unreadable manifest");
            None
        }
    }
}
