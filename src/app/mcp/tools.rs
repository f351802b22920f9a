//! MCP tool definitions.

use serde_json::{Value, json};

use super::protocol::Tool;

fn tool(name: &str, description: &str, input_schema: Value) -> Tool {
    Tool { name: name.into(), description: description.into(), input_schema }
}

fn no_arguments() -> Value {
    json!({ "type": "object", "properties": {} })
}

fn batch_id_argument() -> Value {
    json!({
        "type": "object",
        "properties": {
            "batch_id": { "type": "string", "description": "Identifier returned by run_batch_processing" }
        },
        "required": ["batch_id"]
    })
}

fn content_argument(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "content": { "type": "string", "description": description }
        },
        "required": ["content"]
    })
}

/// Every tool the server exposes, in workflow order.
pub fn get_tools() -> Vec<Tool> {
    vec![
        tool("welcome", "Get started with the Learning Resource Generator.", no_arguments()),
        tool(
            "create_learning_resource_structure",
            "Create a structured learning resource outline with main topics and subtopics.",
            json!({
                "type": "object",
                "properties": {
                    "subject": { "type": "string", "description": "Main subject of the learning resource" },
                    "main_topics": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Main topics to cover"
                    },
                    "subtopics": {
                        "type": "object",
                        "additionalProperties": { "type": "array", "items": { "type": "string" } },
                        "description": "Map from main topic to its subtopics"
                    }
                },
                "required": ["subject", "main_topics"]
            }),
        ),
        tool(
            "generate_system_prompt_template",
            "Draft a system prompt for generating learning resources on a subject.",
            json!({
                "type": "object",
                "properties": {
                    "subject": { "type": "string", "description": "Subject of the learning resources" },
                    "format_style": {
                        "type": "string",
                        "enum": ["markdown", "xml"],
                        "default": "markdown",
                        "description": "Layout of the drafted prompt"
                    }
                },
                "required": ["subject"]
            }),
        ),
        tool(
            "update_system_prompt",
            "Save the system prompt file.",
            content_argument("Full text of the system prompt"),
        ),
        tool(
            "generate_template",
            "Draft a message template using {title} and {description} placeholders.",
            json!({
                "type": "object",
                "properties": {
                    "subject": { "type": "string", "description": "Subject of the learning resources" }
                },
                "required": ["subject"]
            }),
        ),
        tool(
            "update_template",
            "Save the message template file.",
            content_argument("Full text of the message template"),
        ),
        tool(
            "create_variables_csv",
            "Create the variables CSV from a title and a list of topics.",
            json!({
                "type": "object",
                "properties": {
                    "title": { "type": "string", "description": "Main title for the learning resource" },
                    "topics": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Topics, one output file each"
                    },
                    "descriptions": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Optional description per topic; must match topics in length"
                    }
                },
                "required": ["title", "topics"]
            }),
        ),
        tool(
            "run_batch_processing",
            "Submit the saved system prompt, template and variables as one batch.",
            no_arguments(),
        ),
        tool("check_batch_status", "Report the processing phase of a batch.", batch_id_argument()),
        tool(
            "check_batch_results",
            "Download the results of a finished batch, one file per row.",
            batch_id_argument(),
        ),
    ]
}
