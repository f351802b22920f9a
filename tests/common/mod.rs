//! Shared testing utilities for promptbatch CLI tests.

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const SYSTEM_PROMPT: &str = "You write beginner study guides.";
pub const TEMPLATE: &str = "Write a guide to {title}.\n\n{description}";

/// Environment variables the binary reads; cleared so the host cannot leak in.
const MANAGED_ENV: &[&str] = &[
    "ANTHROPIC_API_KEY",
    "ANTHROPIC_BASE_URL",
    "MODEL",
    "MAX_TOKENS",
    "TEMPERATURE",
    "OUTPUT_ENCODING",
    "PROMPTBATCH_DATA_DIR",
];

/// Testing harness providing an isolated working directory for CLI runs.
#[allow(dead_code)]
pub struct TestContext {
    root: TempDir,
    work_dir: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    /// Create a new isolated environment.
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp directory for tests");
        let work_dir = root.path().join("work");
        fs::create_dir_all(&work_dir).expect("Failed to create test work directory");
        Self { root, work_dir }
    }

    /// Path to the directory used for CLI invocations.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Build a command for invoking the compiled `promptbatch` binary.
    pub fn cli(&self) -> Command {
        let mut cmd = Command::cargo_bin("promptbatch").expect("Failed to locate promptbatch binary");
        cmd.current_dir(&self.work_dir).env("HOME", self.root.path());
        for name in MANAGED_ENV {
            cmd.env_remove(name);
        }
        cmd
    }

    /// Build a command that talks to a mock API server.
    pub fn cli_against(&self, server_url: &str) -> Command {
        let mut cmd = self.cli();
        cmd.env("ANTHROPIC_API_KEY", "test-key").env("ANTHROPIC_BASE_URL", format!("{}/v1/", server_url));
        cmd
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.work_dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(path, content).expect("Failed to write test file");
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.work_dir.join(relative)).expect("Failed to read test file")
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.work_dir.join(relative).exists()
    }

    /// Seed system prompt, template and a variables CSV.
    pub fn seed_inputs(&self, csv: &str) {
        self.write("system_prompt.txt", SYSTEM_PROMPT);
        self.write("template.txt", TEMPLATE);
        self.write("variables.csv", csv);
    }
}

/// JSON body for a batch in the given processing state.
#[allow(dead_code)]
pub fn batch_json(id: &str, processing_status: &str, succeeded: u64, errored: u64) -> String {
    serde_json::json!({
        "id": id,
        "type": "message_batch",
        "processing_status": processing_status,
        "request_counts": {
            "processing": if processing_status == "ended" { 0 } else { succeeded + errored },
            "succeeded": succeeded,
            "errored": errored,
            "canceled": 0,
            "expired": 0
        },
        "created_at": "2024-09-24T18:37:24.100435Z",
        "ended_at": null,
        "results_url": null
    })
    .to_string()
}

/// One JSONL line for a succeeded request.
#[allow(dead_code)]
pub fn succeeded_line(custom_id: &str, text: &str) -> String {
    serde_json::json!({
        "custom_id": custom_id,
        "result": {
            "type": "succeeded",
            "message": {
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "content": [{ "type": "text", "text": text }]
            }
        }
    })
    .to_string()
}
