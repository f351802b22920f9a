//! Download the results of a completed batch and write one file per row.

use crate::app::AppContext;
use crate::app::commands::manifest;
use crate::domain::{
    AppError, BatchPhase, FailedRow, FetchReport, ResultOutcome, RowError, WrittenFile,
    output_file_name,
};
use crate::ports::{BatchClient, RunStore};
use crate::services::ResultWriter;

/// Fetch and write the results of `batch_id`.
///
/// A batch that is still processing yields `BatchNotReady` without touching
/// the output directory. Each row is written independently; a row that fails
/// is listed in the report and the remaining rows continue.
///
/// The fallback encoding path is enabled when `fallback` is set, when the
/// configuration enables it, or when it was requested at submission.
pub fn execute<S, C>(
    ctx: &AppContext<S>,
    client: &C,
    batch_id: &str,
    fallback: bool,
) -> Result<FetchReport, AppError>
where
    S: RunStore,
    C: BatchClient + ?Sized,
{
    let config = ctx.config();
    let store = ctx.store();
    let batch_id = batch_id.trim();

    let status = client.retrieve_batch(batch_id)?;
    match status.phase {
        BatchPhase::Submitted | BatchPhase::InProgress => {
            return Err(AppError::BatchNotReady { batch_id: status.id, phase: status.phase });
        }
        BatchPhase::Failed => {
            return Err(AppError::BatchFailed { batch_id: status.id, counts: status.counts });
        }
        BatchPhase::Completed => {}
    }

    let output_dir = &config.output.dir;
    let manifest = manifest::load(store, output_dir, batch_id);
    if manifest.is_none() {
        tracing::info!(batch_id, "No manifest recorded; naming files by custom id");
    }
    let fallback =
        fallback || config.output.fallback || manifest.as_ref().is_some_and(|m| m.fallback);
    let writer = ResultWriter::new(config.output.encoding, fallback);

    let entries = client.batch_results(&status)?;
    let mut report = FetchReport { batch_id: status.id.clone(), ..FetchReport::default() };

    for entry in entries {
        let file_name = match &manifest {
            Some(manifest) => manifest.file_name_for(&entry.custom_id),
            None => output_file_name(&entry.custom_id),
        };

        let error = match entry.outcome {
            ResultOutcome::Succeeded(text) => {
                match writer.write(store, output_dir, &file_name, &text) {
                    Ok(written) => {
                        tracing::debug!(custom_id = %entry.custom_id, path = %written.path.display(), "Wrote result");
                        report.written.push(WrittenFile {
                            custom_id: entry.custom_id,
                            path: written.path,
                            fallback_used: written.fallback_used,
                        });
                        continue;
                    }
                    Err(err) => err,
                }
            }
            ResultOutcome::Errored(message) => RowError::Remote(message),
            ResultOutcome::Canceled => RowError::Remote("request was canceled".into()),
            ResultOutcome::Expired => RowError::Remote("request expired".into()),
        };

        tracing::warn!(custom_id = %entry.custom_id, error = %error, "Result row failed");
        report.failed.push(FailedRow { custom_id: entry.custom_id, error });
    }

    tracing::info!(
        batch_id = %report.batch_id,
        written = report.written.len(),
        failed = report.failed.len(),
        "Fetched batch results"
    );
    Ok(report)
}
