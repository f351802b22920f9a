//! Workflow assistant steps behind the MCP tools.
//!
//! Each step stands alone. Nothing tracks which steps already ran; a step
//! whose input file is absent fails with `ConfigurationMissing`.

use std::collections::HashMap;
use std::path::Path;

use crate::app::AppContext;
use crate::app::commands::{fetch, status, submit};
use crate::domain::template::contains_placeholder;
use crate::domain::{AppError, topic_table};
use crate::ports::{BatchClient, RunStore};
use crate::services::{self, DraftStyle, variables_csv};

/// Workflow instructions.
pub fn welcome() -> Result<String, AppError> {
    services::welcome_text().map(str::to_string)
}

/// Markdown table of contents for a learning resource.
pub fn outline(
    subject: &str,
    main_topics: &[String],
    subtopics: &HashMap<String, Vec<String>>,
) -> String {
    let mut structure = format!("# Learning Resource: {}\n\n## Table of Contents\n\n", subject);
    for (i, topic) in main_topics.iter().enumerate() {
        structure.push_str(&format!("{}. {}\n", i + 1, topic));
        if let Some(children) = subtopics.get(topic) {
            for (j, child) in children.iter().enumerate() {
                structure.push_str(&format!("   {}.{}. {}\n", i + 1, j + 1, child));
            }
        }
        structure.push('\n');
    }
    structure
}

pub fn draft_system_prompt(subject: &str, style: &str) -> Result<String, AppError> {
    services::system_prompt_draft(subject, DraftStyle::from_name(style))
}

pub fn draft_template(subject: &str) -> Result<String, AppError> {
    services::message_template_draft(subject)
}

/// Persist the system prompt to the configured path.
pub fn save_system_prompt<S: RunStore>(ctx: &AppContext<S>, content: &str) -> Result<String, AppError> {
    save(ctx.store(), &ctx.config().paths.system_prompt, content)
}

/// Persist the message template to the configured path.
pub fn save_template<S: RunStore>(ctx: &AppContext<S>, content: &str) -> Result<String, AppError> {
    if !contains_placeholder(content) {
        tracing::warn!("Template has no placeholders; every row will receive the same prompt");
    }
    save(ctx.store(), &ctx.config().paths.template, content)
}

fn save(store: &impl RunStore, path: &Path, content: &str) -> Result<String, AppError> {
    store.write_file(path, content)?;
    let characters = content.chars().count();
    Ok(format!("Successfully updated {} ({} characters)", display_name(path), characters))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Write the variables CSV: an overview row followed by one row per topic.
pub fn create_variables<S: RunStore>(
    ctx: &AppContext<S>,
    title: &str,
    topics: &[String],
    descriptions: Option<&[String]>,
) -> Result<String, AppError> {
    let table = topic_table(title, topics, descriptions).map_err(AppError::Configuration)?;
    let path = &ctx.config().paths.variables;
    ctx.store().write_file(path, &variables_csv::write_table(&table)?)?;
    Ok(format!("Successfully created {} with {} rows", display_name(path), table.rows.len()))
}

/// Submit the persisted inputs as a batch.
pub fn run_batch<S, C>(ctx: &AppContext<S>, client: &C) -> Result<String, AppError>
where
    S: RunStore,
    C: BatchClient + ?Sized,
{
    let report = submit::execute(ctx, client)?;
    let mut text = format!(
        "Batch processing started successfully. Batch ID: {}\n\nSubmitted {} request(s).",
        report.batch_id(),
        report.manifest.rows.len()
    );
    for row in &report.skipped {
        text.push_str(&format!("\nSkipped line {}: {}", row.line, row.error));
    }
    if !report.manifest_saved {
        text.push_str("\nNo batch manifest was written; result files will be named by request id.");
    }
    text.push_str("\n\nNote: Processing may take several minutes. Check progress with check_batch_status.");
    Ok(text)
}

pub fn check_status<C: BatchClient + ?Sized>(client: &C, batch_id: &str) -> Result<String, AppError> {
    status::execute(client, batch_id).map(|status| status::describe(&status))
}

/// Fetch results; a batch that is still processing is reported, not failed.
pub fn check_results<S, C>(ctx: &AppContext<S>, client: &C, batch_id: &str) -> Result<String, AppError>
where
    S: RunStore,
    C: BatchClient + ?Sized,
{
    match fetch::execute(ctx, client, batch_id, false) {
        Ok(report) => {
            let mut text = String::from("Batch results check completed:\n");
            for line in report.summary_lines() {
                text.push('\n');
                text.push_str(&line);
            }
            Ok(text)
        }
        Err(err) if !err.is_fatal() => Ok(format!("{}. Check again later.", err)),
        Err(err) => Err(err),
    }
}
