//! Read-only views of the data directory as MCP resources.

use std::path::Path;

use super::protocol::{Resource, ResourceContents, ResourceTemplate};
use crate::domain::AppError;
use crate::ports::RunStore;

const FILE_SCHEME: &str = "file://";
const DIRECTORY_SCHEME: &str = "directory://";
const TEXT_PLAIN: &str = "text/plain";

pub fn templates() -> Vec<ResourceTemplate> {
    vec![
        ResourceTemplate {
            uri_template: format!("{}{{path}}", FILE_SCHEME),
            name: "file".into(),
            description: "Read a file from the data directory".into(),
            mime_type: TEXT_PLAIN.into(),
        },
        ResourceTemplate {
            uri_template: format!("{}{{path}}", DIRECTORY_SCHEME),
            name: "directory".into(),
            description: "List a directory inside the data directory".into(),
            mime_type: TEXT_PLAIN.into(),
        },
    ]
}

/// Files at the top of the data directory.
pub fn list(store: &impl RunStore) -> Result<Vec<Resource>, AppError> {
    let entries = store.list_dir(Path::new(""))?;
    Ok(entries
        .into_iter()
        .filter(|entry| !entry.is_dir)
        .map(|entry| Resource {
            uri: format!("{}{}", FILE_SCHEME, entry.name),
            name: entry.name,
            mime_type: TEXT_PLAIN.into(),
        })
        .collect())
}

/// Resolve a `file://` or `directory://` URI against the store.
pub fn read(store: &impl RunStore, uri: &str) -> Result<ResourceContents, AppError> {
    let text = if let Some(path) = uri.strip_prefix(FILE_SCHEME) {
        store.read_file(Path::new(path))?
    } else if let Some(path) = uri.strip_prefix(DIRECTORY_SCHEME) {
        describe_directory(store, path)?
    } else {
        return Err(AppError::ParseError {
            what: "resource uri".into(),
            details: format!("unsupported scheme in '{}'", uri),
        });
    };
    Ok(ResourceContents { uri: uri.to_string(), mime_type: TEXT_PLAIN.into(), text })
}

fn describe_directory(store: &impl RunStore, path: &str) -> Result<String, AppError> {
    let entries = store.list_dir(Path::new(path))?;
    let lines: Vec<String> = entries
        .iter()
        .map(|entry| {
            let kind = if entry.is_dir { "Directory" } else { "File" };
            let size = entry.size.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
            format!("{} ({}, {} bytes)", entry.name, kind, size)
        })
        .collect();
    let label = if path.is_empty() { "root directory" } else { path };
    Ok(format!("Contents of {}:\n{}", label, lines.join("\n")))
}
