use std::io;

use thiserror::Error;

use super::batch::{BatchPhase, RequestCounts};

/// Library-wide error type for promptbatch operations.
///
/// Row-level failures (a missing variable, an unwritable result) are not
/// represented here; they are collected as [`RowError`](super::RowError)
/// values inside submit and fetch reports so one bad row never aborts a run.
#[derive(Debug, Error)]
pub enum AppError {
    /// Underlying I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Configuration or environment issue.
    #[error("{0}")]
    Configuration(String),

    /// Configuration value failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A file a step depends on does not exist.
    #[error("{what} file not found: {path}")]
    ConfigurationMissing { what: String, path: String },

    /// Every row of the variable table was skipped, or the table was empty.
    #[error("No valid requests found in {0}")]
    NoRequests(String),

    /// The remote batch-create call failed.
    #[error("Batch submission failed: {0}")]
    Submission(String),

    /// A remote status or results call failed.
    #[error("Remote request failed: {0}")]
    Remote(String),

    /// Results were requested before the batch finished processing.
    #[error("Batch {batch_id} is not ready yet (phase: {phase})")]
    BatchNotReady { batch_id: String, phase: BatchPhase },

    /// The remote side reports the batch as failed.
    #[error("Batch {batch_id} failed: {counts}")]
    BatchFailed { batch_id: String, counts: RequestCounts },

    /// Path escapes the store root.
    #[error("Path traversal detected: {0}")]
    PathTraversal(String),

    /// Parse error.
    #[error("Failed to parse {what}: {details}")]
    ParseError { what: String, details: String },

    /// CSV read or write error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),
}

impl AppError {
    pub fn config_error<S: Into<String>>(message: S) -> Self {
        AppError::Configuration(message.into())
    }

    pub fn missing<W: Into<String>, P: Into<String>>(what: W, path: P) -> Self {
        AppError::ConfigurationMissing { what: what.into(), path: path.into() }
    }

    /// Whether the error should be treated as a crash rather than a status.
    ///
    /// `BatchNotReady` is the only non-fatal variant: the caller is expected
    /// to re-invoke later.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AppError::BatchNotReady { .. })
    }

    /// Provide an `io::ErrorKind`-like view for callers expecting it.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            AppError::Io(err) => err.kind(),
            AppError::Configuration(_)
            | AppError::InvalidConfig(_)
            | AppError::NoRequests(_)
            | AppError::ParseError { .. }
            | AppError::Csv(_)
            | AppError::Json(_)
            | AppError::TomlParseError(_) => io::ErrorKind::InvalidInput,
            AppError::ConfigurationMissing { .. } => io::ErrorKind::NotFound,
            AppError::PathTraversal(_) => io::ErrorKind::PermissionDenied,
            AppError::BatchNotReady { .. } => io::ErrorKind::WouldBlock,
            AppError::Submission(_) | AppError::Remote(_) | AppError::BatchFailed { .. } => {
                io::ErrorKind::Other
            }
        }
    }
}
