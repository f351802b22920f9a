//! Sleep-and-requery loop layered over a single status query.

use std::time::Duration;

use crate::app::commands::status;
use crate::domain::{AppError, BatchStatus};
use crate::ports::BatchClient;

/// Poll until the batch reaches a terminal phase.
///
/// `sleep` is called between queries; the CLI passes `std::thread::sleep`.
pub fn until_terminal<C, F>(
    client: &C,
    batch_id: &str,
    interval: Duration,
    mut sleep: F,
) -> Result<BatchStatus, AppError>
where
    C: BatchClient + ?Sized,
    F: FnMut(Duration),
{
    let mut last_phase = None;
    loop {
        let current = status::execute(client, batch_id)?;
        if current.phase.is_terminal() {
            return Ok(current);
        }
        if last_phase != Some(current.phase) {
            tracing::info!(batch_id, phase = %current.phase, "Waiting for batch to finish");
            last_phase = Some(current.phase);
        }
        sleep(interval);
    }
}
