//! Batch handle, remote phase and per-row results.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::error::AppError;
use super::request::BatchRequestItem;

/// Lifecycle phase of a batch, as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchPhase {
    Submitted,
    InProgress,
    Completed,
    Failed,
}

impl BatchPhase {
    /// Map the provider's `processing_status` and counts to a phase.
    ///
    /// An ended batch in which nothing succeeded but something errored,
    /// was canceled or expired is `Failed`.
    pub fn from_remote(processing_status: &str, counts: &RequestCounts) -> Result<Self, AppError> {
        match processing_status {
            "in_progress" | "canceling" => Ok(BatchPhase::InProgress),
            "ended" => {
                if counts.succeeded == 0 && counts.unsuccessful() > 0 {
                    Ok(BatchPhase::Failed)
                } else {
                    Ok(BatchPhase::Completed)
                }
            }
            other => Err(AppError::ParseError {
                what: "batch processing_status".into(),
                details: format!("unknown status '{}'", other),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BatchPhase::Submitted => "SUBMITTED",
            BatchPhase::InProgress => "IN_PROGRESS",
            BatchPhase::Completed => "COMPLETED",
            BatchPhase::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchPhase::Completed | BatchPhase::Failed)
    }
}

impl fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-state request tallies reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCounts {
    #[serde(default)]
    pub processing: u64,
    #[serde(default)]
    pub succeeded: u64,
    #[serde(default)]
    pub errored: u64,
    #[serde(default)]
    pub canceled: u64,
    #[serde(default)]
    pub expired: u64,
}

impl RequestCounts {
    pub fn unsuccessful(&self) -> u64 {
        self.errored + self.canceled + self.expired
    }
}

impl fmt::Display for RequestCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processing={} succeeded={} errored={} canceled={} expired={}",
            self.processing, self.succeeded, self.errored, self.canceled, self.expired
        )
    }
}

/// Remote state of a batch at the time of the query.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchStatus {
    pub id: String,
    pub phase: BatchPhase,
    /// Raw `processing_status` string from the provider.
    pub processing_status: String,
    pub counts: RequestCounts,
    pub results_url: Option<Url>,
    pub created_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Outcome of one request inside a completed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultOutcome {
    Succeeded(String),
    Errored(String),
    Canceled,
    Expired,
}

/// One line of the provider's results stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResultEntry {
    pub custom_id: String,
    pub outcome: ResultOutcome,
}

/// Row recorded in the batch manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRow {
    pub custom_id: String,
    pub title: String,
    pub file_name: String,
}

/// Local handle for a submitted batch.
///
/// Holds nothing mutable beyond the identifier; it records which rows the
/// batch covers so a later invocation can name the output files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchManifest {
    pub batch_id: String,
    pub submitted_at: DateTime<Utc>,
    /// Fallback preference given at submission, used when fetching later.
    #[serde(default)]
    pub fallback: bool,
    pub rows: Vec<ManifestRow>,
}

impl BatchManifest {
    pub fn new(
        batch_id: impl Into<String>,
        submitted_at: DateTime<Utc>,
        fallback: bool,
        items: &[BatchRequestItem],
    ) -> Self {
        let mut taken = HashSet::new();
        let rows = items
            .iter()
            .map(|item| {
                let mut file_name = output_file_name(&item.title);
                let mut attempt = 1;
                while !taken.insert(file_name.clone()) {
                    let suffix = match attempt {
                        1 => item.custom_id.clone(),
                        n => format!("{}_{}", item.custom_id, n),
                    };
                    file_name = output_file_name(&format!("{}_{}", item.title, suffix));
                    attempt += 1;
                }
                ManifestRow {
                    custom_id: item.custom_id.clone(),
                    title: item.title.clone(),
                    file_name,
                }
            })
            .collect();
        Self { batch_id: batch_id.into(), submitted_at, fallback, rows }
    }

    pub fn row(&self, custom_id: &str) -> Option<&ManifestRow> {
        self.rows.iter().find(|row| row.custom_id == custom_id)
    }

    /// Output file for a result, falling back to the custom id.
    pub fn file_name_for(&self, custom_id: &str) -> String {
        self.row(custom_id)
            .map(|row| row.file_name.clone())
            .unwrap_or_else(|| output_file_name(custom_id))
    }
}

/// Derive a safe output file name from a row title.
///
/// Whitespace becomes `_`; anything outside `[A-Za-z0-9._-]` also becomes
/// `_`, so the name never contains a path separator.
pub fn output_file_name(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect();
    let stem = stem.trim_start_matches('.');
    if stem.is_empty() { "untitled.txt".to_string() } else { format!("{}.txt", stem) }
}
