//! MCP server
//!
//! Main loop handling line-delimited JSON-RPC messages. Responses go to the
//! writer; diagnostics go through `tracing` to stderr.

use std::io::{BufRead, Write};

use serde::Serialize;
use serde_json::Value;

use super::handlers::ToolHandlers;
use super::protocol::*;
use super::resources;
use super::tools::get_tools;
use crate::domain::AppError;
use crate::ports::{BatchClientFactory, RunStore};

const SERVER_NAME: &str = "promptbatch";

const INSTRUCTIONS: &str = "Helps create structured learning resources with batch processing. \
Call welcome for the step-by-step workflow.";

pub struct McpServer<S: RunStore, F: BatchClientFactory> {
    handlers: ToolHandlers<S, F>,
}

fn preview(line: &str) -> &str {
    match line.char_indices().nth(100) {
        Some((end, _)) => &line[..end],
        None => line,
    }
}

fn to_response<T: Serialize>(id: Option<Value>, result: T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(v) => JsonRpcResponse::success(id, v),
        Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, format!("Serialization error: {}", e)),
    }
}

fn resource_error(id: Option<Value>, err: AppError) -> JsonRpcResponse {
    let code = match err {
        AppError::Io(ref io) if io.kind() != std::io::ErrorKind::NotFound => INTERNAL_ERROR,
        _ => INVALID_PARAMS,
    };
    JsonRpcResponse::error(id, code, err.to_string())
}

impl<S: RunStore, F: BatchClientFactory> McpServer<S, F> {
    pub fn new(handlers: ToolHandlers<S, F>) -> Self {
        Self { handlers }
    }

    /// Serve until the reader reaches end of input.
    pub fn run(&self, reader: impl BufRead, mut writer: impl Write) -> Result<(), AppError> {
        tracing::info!("MCP server started, waiting for messages");

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            tracing::debug!("<- {}", preview(&line));

            let Some(response) = self.handle(&line) else { continue };
            let out = serde_json::to_string(&response)?;
            tracing::debug!("-> {}", preview(&out));

            writeln!(writer, "{}", out)?;
            writer.flush()?;
        }

        tracing::info!("MCP server shutting down");
        Ok(())
    }

    /// Handle a single JSON-RPC message. Notifications yield no response.
    pub fn handle(&self, msg: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(msg) {
            Ok(v) => v,
            Err(e) => return Some(JsonRpcResponse::error(None, PARSE_ERROR, e.to_string())),
        };
        let id = value.get("id").cloned();
        let req: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => return Some(JsonRpcResponse::error(id, INVALID_REQUEST, e.to_string())),
        };
        if req.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(id, INVALID_REQUEST, "jsonrpc must be \"2.0\""));
        }

        if req.is_notification() {
            tracing::debug!(method = %req.method, "Notification received");
            return None;
        }
        Some(self.dispatch(req))
    }

    fn dispatch(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        let id = req.id;

        match req.method.as_str() {
            "initialize" => to_response(
                id,
                InitializeResult {
                    protocol_version: PROTOCOL_VERSION.into(),
                    capabilities: ServerCapabilities {
                        tools: ListChanged { list_changed: false },
                        resources: ResourcesCapability { subscribe: false, list_changed: false },
                    },
                    server_info: ServerInfo {
                        name: SERVER_NAME.into(),
                        version: env!("CARGO_PKG_VERSION").into(),
                    },
                    instructions: INSTRUCTIONS.into(),
                },
            ),

            "ping" => JsonRpcResponse::success(id, Value::Object(Default::default())),

            "tools/list" => to_response(id, ToolsListResult { tools: get_tools() }),

            "tools/call" => {
                let params: ToolCallParams = match serde_json::from_value(req.params) {
                    Ok(p) => p,
                    Err(e) => return JsonRpcResponse::error(id, INVALID_PARAMS, e.to_string()),
                };

                tracing::info!(tool = %params.name, "Calling tool");
                match self.handlers.handle(&params.name, params.arguments) {
                    Ok(result) => to_response(id, result),
                    Err(invalid) => JsonRpcResponse::error(id, INVALID_PARAMS, invalid.0),
                }
            }

            "resources/list" => match resources::list(self.handlers.store()) {
                Ok(resources) => to_response(id, ResourcesListResult { resources }),
                Err(e) => resource_error(id, e),
            },

            "resources/templates/list" => {
                to_response(id, ResourceTemplatesListResult { resource_templates: resources::templates() })
            }

            "resources/read" => {
                let params: ResourceReadParams = match serde_json::from_value(req.params) {
                    Ok(p) => p,
                    Err(e) => return JsonRpcResponse::error(id, INVALID_PARAMS, e.to_string()),
                };
                match resources::read(self.handlers.store(), &params.uri) {
                    Ok(contents) => to_response(id, ResourceReadResult { contents: vec![contents] }),
                    Err(e) => resource_error(id, e),
                }
            }

            _ => JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Unknown method: {}", req.method)),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::app::AppContext;
    use crate::domain::RunConfig;
    use crate::ports::BatchClient;
    use crate::testing::MemoryRunStore;

    struct NoCredentials;

    impl BatchClientFactory for NoCredentials {
        fn create(&self) -> Result<Box<dyn BatchClient>, AppError> {
            Err(AppError::Configuration("API key not found".into()))
        }
    }

    fn server(store: MemoryRunStore) -> McpServer<MemoryRunStore, NoCredentials> {
        McpServer::new(ToolHandlers::new(AppContext::new(store, RunConfig::default()), NoCredentials))
    }

    fn call(server: &McpServer<MemoryRunStore, NoCredentials>, request: Value) -> Value {
        let response = server.handle(&request.to_string()).expect("response");
        serde_json::to_value(response).unwrap()
    }

    #[test]
    fn initialize_reports_capabilities() {
        let response = call(&server(MemoryRunStore::new()), json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}));
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(response["result"]["serverInfo"]["name"], SERVER_NAME);
        assert!(response["result"]["capabilities"]["resources"].is_object());
    }

    #[test]
    fn notifications_get_no_response() {
        let server = server(MemoryRunStore::new());
        assert!(server.handle(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).is_none());
    }

    #[test]
    fn protocol_errors_use_json_rpc_codes() {
        let server = server(MemoryRunStore::new());

        let parse = call(&server, Value::String("{".into()));
        assert_eq!(parse["error"]["code"], INVALID_REQUEST);

        let raw = serde_json::to_value(server.handle("{not json").unwrap()).unwrap();
        assert_eq!(raw["error"]["code"], PARSE_ERROR);
        assert_eq!(raw["id"], Value::Null);

        let unknown = call(&server, json!({"jsonrpc": "2.0", "id": 2, "method": "tools/frobnicate"}));
        assert_eq!(unknown["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(unknown["id"], 2);

        let bad_tool = call(&server, json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": {"name": "nope"}}));
        assert_eq!(bad_tool["error"]["code"], INVALID_PARAMS);
    }

    #[test]
    fn tools_call_returns_text_content() {
        let server = server(MemoryRunStore::new());
        let response = call(
            &server,
            json!({"jsonrpc": "2.0", "id": "a", "method": "tools/call", "params": {"name": "generate_template", "arguments": {"subject": "Rust"}}}),
        );
        assert_eq!(response["result"]["isError"], false);
        assert_eq!(response["result"]["content"][0]["type"], "text");
        assert!(response["result"]["content"][0]["text"].as_str().unwrap().contains("{title}"));
    }

    #[test]
    fn resources_read_serves_data_files() {
        let server = server(MemoryRunStore::new().with_file("template.txt", "About {title}"));

        let response = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 4, "method": "resources/read", "params": {"uri": "file://template.txt"}}),
        );

        assert_eq!(response["result"]["contents"][0]["text"], "About {title}");
    }

    #[test]
    fn run_loop_writes_one_line_per_response() {
        let server = server(MemoryRunStore::new());
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n"
        );
        let mut output = Vec::new();

        server.run(input.as_bytes(), &mut output).unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[1]["result"]["tools"].as_array().unwrap().len(), 10);
    }
}
