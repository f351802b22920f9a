//! Render every variable row and submit the requests as one batch.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;

use crate::app::AppContext;
use crate::app::commands::manifest;
use crate::domain::{
    AppError, BatchManifest, BatchRequestItem, GenerationParams, MessageTemplate, RowError,
    SkippedRow, SubmitReport, SystemPrompt, TemplateError, VariableTable, build_request,
};
use crate::ports::{BatchClient, RunStore};
use crate::services::variables_csv;

/// Submit the configured template, system prompt and variable table.
///
/// Rows that cannot be rendered are skipped and listed in the report. The
/// remote create call is made once; its error is returned unchanged. Once
/// the batch exists, a manifest write failure is logged, never returned.
pub fn execute<S, C>(ctx: &AppContext<S>, client: &C) -> Result<SubmitReport, AppError>
where
    S: RunStore,
    C: BatchClient + ?Sized,
{
    let config = ctx.config();
    let store = ctx.store();
    let paths = &config.paths;

    let system_text = read_required(store, "System prompt", &paths.system_prompt)?;
    let template = MessageTemplate::new(read_required(store, "Template", &paths.template)?);
    let table = variables_csv::read_table(&read_required(store, "Variables", &paths.variables)?)?;

    let system = Arc::new(SystemPrompt::new(system_text, config.prompt.cache_system_prompt));
    let (items, skipped) = build_items(&template, &table, &system, &config.generation);

    for row in &skipped {
        tracing::warn!(line = row.line, error = %row.error, "Skipping row");
    }
    if items.is_empty() {
        return Err(AppError::NoRequests(paths.variables.display().to_string()));
    }

    tracing::info!(
        requests = items.len(),
        skipped = skipped.len(),
        model = %config.generation.model,
        "Submitting batch"
    );
    let status = client.create_batch(&items)?;
    tracing::info!(batch_id = %status.id, phase = %status.phase, "Batch created");

    let manifest = BatchManifest::new(status.id.clone(), Utc::now(), config.output.fallback, &items);
    // Best-effort from here: the remote batch already exists.
    let manifest_saved = match manifest::save(store, &config.output.dir, &manifest) {
        Ok(true) => true,
        Ok(false) => {
            tracing::warn!(
                batch_id = %manifest.batch_id,
                "Batch id is not usable as a file name; no manifest written"
            );
            false
        }
        Err(err) => {
            tracing::warn!(batch_id = %manifest.batch_id, error = %err, "Failed to write batch manifest");
            false
        }
    };

    Ok(SubmitReport { manifest, status, skipped, manifest_saved })
}

fn read_required(store: &impl RunStore, what: &str, path: &Path) -> Result<String, AppError> {
    if !store.file_exists(path) || store.is_dir(path) {
        return Err(AppError::missing(what, path.display().to_string()));
    }
    store.read_file(path)
}

/// Render each row into a request, collecting the rows that fail.
pub fn build_items(
    template: &MessageTemplate,
    table: &VariableTable,
    system: &Arc<SystemPrompt>,
    params: &GenerationParams,
) -> (Vec<BatchRequestItem>, Vec<SkippedRow>) {
    let title_key = template.placeholders().first().map(|name| name.to_string());
    let mut items = Vec::with_capacity(table.rows.len());
    let mut skipped = Vec::new();

    for row in &table.rows {
        match template.render(row) {
            Ok(prompt) => {
                let title = title_key
                    .as_deref()
                    .and_then(|key| row.get(key))
                    .filter(|value| !value.trim().is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("row_{}", row.index()));
                items.push(build_request(row.index(), title, prompt, system, params));
            }
            Err(TemplateError::MissingVariable { names }) => {
                skipped.push(SkippedRow { line: row.line(), error: RowError::MissingVariable { names } });
            }
        }
    }

    (items, skipped)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::domain::{BatchPhase, RunConfig};
    use crate::services::FilesystemStore;
    use crate::testing::{FakeBatchClient, MemoryRunStore};

    fn ctx(store: MemoryRunStore) -> AppContext<MemoryRunStore> {
        AppContext::new(store, RunConfig::default())
    }

    fn seeded(csv: &str) -> MemoryRunStore {
        MemoryRunStore::new()
            .with_file("system_prompt.txt", "You write study guides.")
            .with_file("template.txt", "Guide to {title}: {description}")
            .with_file("variables.csv", csv)
    }

    #[test]
    fn submits_one_request_per_row_and_records_manifest() {
        let store = seeded("title,description\nLoops,Repeat\nTraits,Share behaviour\n");
        let client = FakeBatchClient::new("msgbatch_01");

        let report = execute(&ctx(store.clone()), &client).unwrap();

        assert_eq!(report.batch_id(), "msgbatch_01");
        assert_eq!(report.status.phase, BatchPhase::Submitted);
        assert!(report.skipped.is_empty());

        let created = client.created_items();
        assert_eq!(created.len(), 1);
        let items = &created[0];
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].custom_id, "request_0");
        assert_eq!(items[0].title, "Loops");
        assert_eq!(items[1].prompt, "Guide to Traits: Share behaviour");
        assert!(items[0].system.cacheable);
        assert!(Arc::ptr_eq(&items[0].system, &items[1].system));

        assert!(report.manifest_saved);
        let manifest = store.text("responses/.batches/msgbatch_01.json").unwrap();
        assert!(manifest.contains("\"file_name\": \"Loops.txt\""));
    }

    #[test]
    fn unwritable_output_dir_still_returns_batch_id() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("system_prompt.txt"), "You write study guides.").unwrap();
        std::fs::write(root.join("template.txt"), "Guide to {title}: {description}").unwrap();
        std::fs::write(root.join("variables.csv"), "title,description\nLoops,Repeat\n").unwrap();
        std::fs::write(root.join("responses"), "not a directory").unwrap();
        let client = FakeBatchClient::new("msgbatch_live");
        let ctx = AppContext::new(FilesystemStore::new(root.to_path_buf()), RunConfig::default());

        let report = execute(&ctx, &client).unwrap();

        assert_eq!(report.batch_id(), "msgbatch_live");
        assert!(!report.manifest_saved);
        assert_eq!(client.created_items().len(), 1);
    }

    #[test]
    fn unsafe_batch_id_skips_manifest_without_error() {
        let store = seeded("title,description\nLoops,Repeat\n");
        let client = FakeBatchClient::new("batch/with/slashes");

        let report = execute(&ctx(store.clone()), &client).unwrap();

        assert_eq!(report.batch_id(), "batch/with/slashes");
        assert!(!report.manifest_saved);
        assert!(store.paths().iter().all(|p| !p.starts_with("responses")));
    }

    #[test]
    fn rows_missing_variables_are_skipped_with_line_numbers() {
        let store = seeded("title,description\nLoops,Repeat\nOnly title\n");
        let client = FakeBatchClient::new("b1");

        let report = execute(&ctx(store), &client).unwrap();

        assert_eq!(report.manifest.rows.len(), 1);
        assert_eq!(
            report.skipped,
            vec![SkippedRow {
                line: 3,
                error: RowError::MissingVariable { names: vec!["description".into()] },
            }]
        );
    }

    #[test]
    fn no_renderable_rows_is_an_error() {
        let store = seeded("title\nLoops\n");
        let client = FakeBatchClient::new("b1");

        let err = execute(&ctx(store), &client).unwrap_err();

        assert!(matches!(err, AppError::NoRequests(_)));
        assert!(client.created_items().is_empty());
    }

    #[test]
    fn missing_template_names_the_file() {
        let store = MemoryRunStore::new()
            .with_file("system_prompt.txt", "sys")
            .with_file("variables.csv", "title\nA\n");

        let err = execute(&ctx(store), &FakeBatchClient::new("b1")).unwrap_err();

        match err {
            AppError::ConfigurationMissing { what, path } => {
                assert_eq!(what, "Template");
                assert_eq!(PathBuf::from(path), PathBuf::from("template.txt"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn submission_error_is_returned_unchanged() {
        let store = seeded("title,description\nLoops,Repeat\n");
        let client = FakeBatchClient::new("b1").failing_create();

        let err = execute(&ctx(store.clone()), &client).unwrap_err();

        assert!(matches!(err, AppError::Submission(ref msg) if msg.contains("401")));
        assert!(store.paths().iter().all(|p| !p.starts_with("responses")));
    }

    #[test]
    fn template_without_placeholders_titles_rows_by_index() {
        let template = MessageTemplate::new("Say hello");
        let mut table = VariableTable::new(vec!["title".into()]);
        table.push_record(["A"]);
        table.push_record(["B"]);
        let system = Arc::new(SystemPrompt::new("", true));

        let (items, skipped) =
            build_items(&template, &table, &system, &GenerationParams::default());

        assert!(skipped.is_empty());
        assert_eq!(items[1].title, "row_1");
        assert_eq!(items[1].prompt, "Say hello");
    }
}
