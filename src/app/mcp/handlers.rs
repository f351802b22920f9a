//! MCP tool handlers.
//!
//! Each tool maps onto one workflow assistant step. Arguments are decoded
//! into typed structs; a decoding failure is a protocol error, while a step
//! failure becomes an `isError` tool result.

use std::collections::HashMap;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::protocol::ToolCallResult;
use crate::app::AppContext;
use crate::app::commands::assistant;
use crate::domain::AppError;
use crate::ports::{BatchClientFactory, RunStore};

/// Arguments that could not be decoded, or an unknown tool name.
#[derive(Debug)]
pub struct InvalidParams(pub String);

#[derive(Deserialize)]
struct StructureArgs {
    subject: String,
    main_topics: Vec<String>,
    #[serde(default)]
    subtopics: Option<HashMap<String, Vec<String>>>,
}

#[derive(Deserialize)]
struct SystemPromptArgs {
    subject: String,
    #[serde(default)]
    format_style: Option<String>,
}

#[derive(Deserialize)]
struct SubjectArgs {
    subject: String,
}

#[derive(Deserialize)]
struct ContentArgs {
    content: String,
}

#[derive(Deserialize)]
struct VariablesArgs {
    title: String,
    topics: Vec<String>,
    #[serde(default)]
    descriptions: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct BatchIdArgs {
    batch_id: String,
}

fn decode<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T, InvalidParams> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|e| InvalidParams(format!("Invalid arguments for {}: {}", tool, e)))
}

/// Tool handlers over the data-directory store.
pub struct ToolHandlers<S: RunStore, F: BatchClientFactory> {
    ctx: AppContext<S>,
    clients: F,
}

impl<S: RunStore, F: BatchClientFactory> ToolHandlers<S, F> {
    pub fn new(ctx: AppContext<S>, clients: F) -> Self {
        Self { ctx, clients }
    }

    pub fn store(&self) -> &S {
        self.ctx.store()
    }

    /// Handle a tool call by name
    pub fn handle(&self, name: &str, args: Value) -> Result<ToolCallResult, InvalidParams> {
        let outcome = self.dispatch(name, args)?;
        Ok(match outcome {
            Ok(text) => ToolCallResult::text(text),
            Err(err) => {
                tracing::warn!(tool = name, error = %err, "Tool call failed");
                ToolCallResult::error(format!("Error: {}", err))
            }
        })
    }

    fn dispatch(&self, name: &str, args: Value) -> Result<Result<String, AppError>, InvalidParams> {
        let ctx = &self.ctx;
        let outcome = match name {
            "welcome" => assistant::welcome(),
            "create_learning_resource_structure" => {
                let args: StructureArgs = decode(name, args)?;
                let subtopics = args.subtopics.unwrap_or_default();
                Ok(assistant::outline(&args.subject, &args.main_topics, &subtopics))
            }
            "generate_system_prompt_template" => {
                let args: SystemPromptArgs = decode(name, args)?;
                let style = args.format_style.unwrap_or_else(|| "markdown".into());
                assistant::draft_system_prompt(&args.subject, &style)
            }
            "update_system_prompt" => {
                let args: ContentArgs = decode(name, args)?;
                assistant::save_system_prompt(ctx, &args.content)
            }
            "generate_template" => {
                let args: SubjectArgs = decode(name, args)?;
                assistant::draft_template(&args.subject)
            }
            "update_template" => {
                let args: ContentArgs = decode(name, args)?;
                assistant::save_template(ctx, &args.content)
            }
            "create_variables_csv" => {
                let args: VariablesArgs = decode(name, args)?;
                assistant::create_variables(ctx, &args.title, &args.topics, args.descriptions.as_deref())
            }
            "run_batch_processing" => {
                self.clients.create().and_then(|client| assistant::run_batch(ctx, client.as_ref()))
            }
            "check_batch_status" => {
                let args: BatchIdArgs = decode(name, args)?;
                self.clients
                    .create()
                    .and_then(|client| assistant::check_status(client.as_ref(), &args.batch_id))
            }
            "check_batch_results" => {
                let args: BatchIdArgs = decode(name, args)?;
                self.clients
                    .create()
                    .and_then(|client| assistant::check_results(ctx, client.as_ref(), &args.batch_id))
            }
            _ => return Err(InvalidParams(format!("Unknown tool: {}", name))),
        };
        Ok(outcome)
    }
}
