//! Message batch API port definition.

use crate::domain::{AppError, BatchRequestItem, BatchResultEntry, BatchStatus};

/// Port for the remote batch API.
///
/// Each method is a single remote call; nothing here polls or retries.
pub trait BatchClient {
    /// Submit every item as one batch. The returned status carries the
    /// provider-issued identifier and phase `Submitted`.
    fn create_batch(&self, items: &[BatchRequestItem]) -> Result<BatchStatus, AppError>;

    /// Query the current state of a batch.
    fn retrieve_batch(&self, batch_id: &str) -> Result<BatchStatus, AppError>;

    /// Download the per-request results of an ended batch.
    fn batch_results(&self, status: &BatchStatus) -> Result<Vec<BatchResultEntry>, AppError>;
}

impl<T: BatchClient + ?Sized> BatchClient for &T {
    fn create_batch(&self, items: &[BatchRequestItem]) -> Result<BatchStatus, AppError> {
        (**self).create_batch(items)
    }

    fn retrieve_batch(&self, batch_id: &str) -> Result<BatchStatus, AppError> {
        (**self).retrieve_batch(batch_id)
    }

    fn batch_results(&self, status: &BatchStatus) -> Result<Vec<BatchResultEntry>, AppError> {
        (**self).batch_results(status)
    }
}

impl<T: BatchClient + ?Sized> BatchClient for Box<T> {
    fn create_batch(&self, items: &[BatchRequestItem]) -> Result<BatchStatus, AppError> {
        (**self).create_batch(items)
    }

    fn retrieve_batch(&self, batch_id: &str) -> Result<BatchStatus, AppError> {
        (**self).retrieve_batch(batch_id)
    }

    fn batch_results(&self, status: &BatchStatus) -> Result<Vec<BatchResultEntry>, AppError> {
        (**self).batch_results(status)
    }
}

/// Builds a client on demand.
///
/// The MCP server starts without requiring credentials; the key is resolved
/// only when a tool first needs the remote API.
pub trait BatchClientFactory {
    fn create(&self) -> Result<Box<dyn BatchClient>, AppError>;
}
