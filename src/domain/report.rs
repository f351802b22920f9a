//! Reports returned by submit and fetch.

use std::fmt;
use std::path::PathBuf;

use super::batch::{BatchManifest, BatchStatus};
use super::output_encoding::Unrepresentable;

/// A failure confined to a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    /// The template references keys the row does not have.
    MissingVariable { names: Vec<String> },
    /// The primary encoding cannot represent the returned text and the
    /// fallback path is disabled.
    Encoding(String),
    /// Writing the result file failed.
    Write(String),
    /// The provider returned an error entry for the request.
    Remote(String),
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowError::MissingVariable { names } => {
                write!(f, "missing variables: {}", names.join(", "))
            }
            RowError::Encoding(details) => write!(f, "encoding error: {}", details),
            RowError::Write(details) => write!(f, "write failed: {}", details),
            RowError::Remote(details) => write!(f, "request failed: {}", details),
        }
    }
}

/// A CSV row that was not submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based CSV line number.
    pub line: usize,
    pub error: RowError,
}

/// Outcome of a successful submission.
#[derive(Debug, Clone)]
pub struct SubmitReport {
    pub manifest: BatchManifest,
    pub status: BatchStatus,
    pub skipped: Vec<SkippedRow>,
    /// The manifest sidecar was written; without it results are named by
    /// custom id.
    pub manifest_saved: bool,
}

impl SubmitReport {
    pub fn batch_id(&self) -> &str {
        &self.manifest.batch_id
    }
}

/// A result file written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub custom_id: String,
    pub path: PathBuf,
    /// The fallback encoding was used instead of the primary one.
    pub fallback_used: bool,
}

/// A result row that produced no file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRow {
    pub custom_id: String,
    pub error: RowError,
}

/// Outcome of fetching a completed batch.
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    pub batch_id: String,
    pub written: Vec<WrittenFile>,
    pub failed: Vec<FailedRow>,
}

impl FetchReport {
    /// One line per row, suitable for printing.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.written.len() + self.failed.len());
        for file in &self.written {
            let note = if file.fallback_used { " (fallback encoding)" } else { "" };
            lines.push(format!("{} -> {}{}", file.custom_id, file.path.display(), note));
        }
        for row in &self.failed {
            lines.push(format!("{} !! {}", row.custom_id, row.error));
        }
        lines
    }
}

impl From<Unrepresentable> for RowError {
    fn from(value: Unrepresentable) -> Self {
        RowError::Encoding(value.to_string())
    }
}
