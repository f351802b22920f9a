mod common;

use common::TestContext;
use predicates::prelude::*;

#[test]
fn help_lists_subcommands() {
    let ctx = TestContext::new();

    ctx.cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("submit"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("results"))
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn submit_requires_csv_flag() {
    let ctx = TestContext::new();

    ctx.cli().arg("submit").assert().failure().stderr(predicate::str::contains("--csv"));
}

#[test]
fn submit_without_api_key_fails() {
    let ctx = TestContext::new();
    ctx.seed_inputs("title,description\nLoops,Repeat\n");

    ctx.cli()
        .args(["submit", "--csv", "variables.csv"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("API key not found"));
}

#[test]
fn submit_reports_missing_input_file() {
    let ctx = TestContext::new();
    ctx.write("variables.csv", "title\nLoops\n");

    ctx.cli()
        .args(["submit", "--csv", "variables.csv", "--api-key", "k"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("System prompt file not found: system_prompt.txt"));
}

#[test]
fn submit_with_no_renderable_rows_fails_before_any_request() {
    let ctx = TestContext::new();
    ctx.seed_inputs("title\nLoops\n");

    // No server is listening here; reaching the network would fail differently.
    ctx.cli()
        .args(["submit", "--csv", "variables.csv", "--api-key", "k"])
        .env("ANTHROPIC_BASE_URL", "http://127.0.0.1:9/v1/")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No valid requests found in variables.csv"))
        .stderr(predicate::str::contains("Skipping row"));
}

#[test]
fn invalid_temperature_is_rejected() {
    let ctx = TestContext::new();
    ctx.seed_inputs("title,description\nLoops,Repeat\n");

    ctx.cli()
        .args(["submit", "--csv", "variables.csv", "--api-key", "k", "--temperature", "1.5"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("temperature"));
}

#[test]
fn malformed_config_file_is_reported() {
    let ctx = TestContext::new();
    ctx.write("promptbatch.toml", "[generation]\nmodle = \"typo\"\n");

    ctx.cli()
        .args(["status", "--batch-id", "b1", "--api-key", "k"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("TOML parse error"));
}

#[test]
fn unknown_encoding_is_a_usage_error() {
    let ctx = TestContext::new();

    ctx.cli()
        .args(["results", "--batch-id", "b1", "--encoding", "ebcdic"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ebcdic"));
}
