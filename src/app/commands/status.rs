use crate::domain::{AppError, BatchStatus};
use crate::ports::BatchClient;

/// Query the remote phase of a batch once.
pub fn execute<C: BatchClient + ?Sized>(client: &C, batch_id: &str) -> Result<BatchStatus, AppError> {
    let batch_id = batch_id.trim();
    if batch_id.is_empty() {
        return Err(AppError::Configuration("Batch id must not be empty".into()));
    }
    let status = client.retrieve_batch(batch_id)?;
    tracing::info!(batch_id = %status.id, phase = %status.phase, counts = %status.counts, "Batch status");
    Ok(status)
}

/// Human-readable status block.
pub fn describe(status: &BatchStatus) -> String {
    let mut text = format!(
        "Batch {}: {} ({})\n  {}",
        status.id, status.phase, status.processing_status, status.counts
    );
    if let Some(created_at) = status.created_at {
        text.push_str(&format!("\n  created: {}", created_at.to_rfc3339()));
    }
    if let Some(ended_at) = status.ended_at {
        text.push_str(&format!("\n  ended: {}", ended_at.to_rfc3339()));
    }
    text
}
