use std::sync::{Arc, Mutex};

use crate::domain::{
    AppError, BatchPhase, BatchRequestItem, BatchResultEntry, BatchStatus, RequestCounts,
    ResultOutcome,
};
use crate::ports::BatchClient;

/// Scripted batch client.
///
/// `create_batch` records the submitted items. `retrieve_batch` pops the next
/// scripted status, repeating the last one once the script runs out.
#[derive(Clone)]
pub struct FakeBatchClient {
    pub batch_id: String,
    pub created: Arc<Mutex<Vec<Vec<BatchRequestItem>>>>,
    statuses: Arc<Mutex<Vec<BatchStatus>>>,
    results: Arc<Mutex<Vec<BatchResultEntry>>>,
    pub fail_create: bool,
}

impl FakeBatchClient {
    pub fn new(batch_id: impl Into<String>) -> Self {
        Self {
            batch_id: batch_id.into(),
            created: Arc::new(Mutex::new(vec![])),
            statuses: Arc::new(Mutex::new(vec![])),
            results: Arc::new(Mutex::new(vec![])),
            fail_create: false,
        }
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// Queue a status with the given phase and counts.
    pub fn with_status(self, phase: BatchPhase, counts: RequestCounts) -> Self {
        let status = self.status(phase, counts);
        self.statuses.lock().unwrap().push(status);
        self
    }

    pub fn with_result(self, custom_id: &str, outcome: ResultOutcome) -> Self {
        self.results
            .lock()
            .unwrap()
            .push(BatchResultEntry { custom_id: custom_id.to_string(), outcome });
        self
    }

    pub fn with_text(self, custom_id: &str, text: &str) -> Self {
        self.with_result(custom_id, ResultOutcome::Succeeded(text.to_string()))
    }

    pub fn created_items(&self) -> Vec<Vec<BatchRequestItem>> {
        self.created.lock().unwrap().clone()
    }

    fn status(&self, phase: BatchPhase, counts: RequestCounts) -> BatchStatus {
        let processing_status = match phase {
            BatchPhase::Submitted | BatchPhase::InProgress => "in_progress",
            BatchPhase::Completed | BatchPhase::Failed => "ended",
        };
        BatchStatus {
            id: self.batch_id.clone(),
            phase,
            processing_status: processing_status.to_string(),
            counts,
            results_url: None,
            created_at: None,
            ended_at: None,
        }
    }
}

impl BatchClient for FakeBatchClient {
    fn create_batch(&self, items: &[BatchRequestItem]) -> Result<BatchStatus, AppError> {
        if self.fail_create {
            return Err(AppError::Submission("HTTP 401: invalid x-api-key".into()));
        }
        self.created.lock().unwrap().push(items.to_vec());
        let counts = RequestCounts { processing: items.len() as u64, ..RequestCounts::default() };
        Ok(self.status(BatchPhase::Submitted, counts))
    }

    fn retrieve_batch(&self, batch_id: &str) -> Result<BatchStatus, AppError> {
        if batch_id != self.batch_id {
            return Err(AppError::Remote(format!("HTTP 404: batch {} not found", batch_id)));
        }
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            return Ok(statuses.remove(0));
        }
        statuses.first().cloned().ok_or_else(|| AppError::Remote("no scripted status".into()))
    }

    fn batch_results(&self, _status: &BatchStatus) -> Result<Vec<BatchResultEntry>, AppError> {
        Ok(self.results.lock().unwrap().clone())
    }
}
