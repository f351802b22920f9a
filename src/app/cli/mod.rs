//! CLI adapter.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::app::api::{self, RunOverrides};
use crate::domain::{ApiKey, AppError, OutputEncoding};

/// Exit code for a batch that has not finished yet.
pub const EXIT_NOT_READY: i32 = 2;

#[derive(Parser)]
#[command(name = "promptbatch")]
#[command(version)]
#[command(about = "Submit templated prompts as a message batch and collect the results", long_about = None)]
struct Cli {
    /// Configuration file (default: promptbatch.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every CSV row and submit the prompts as one batch
    Submit {
        /// Variables CSV; the header row names the template placeholders
        #[arg(long)]
        csv: PathBuf,
        /// System prompt file
        #[arg(long)]
        system: Option<PathBuf>,
        /// Message template file
        #[arg(long)]
        template: Option<PathBuf>,
        /// Model identifier
        #[arg(long)]
        model: Option<String>,
        /// Maximum tokens per response
        #[arg(long)]
        max_tokens: Option<u32>,
        /// Sampling temperature (0.0 to 1.0)
        #[arg(long)]
        temperature: Option<f32>,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Show the processing phase of a batch
    Status {
        /// Batch identifier
        #[arg(long)]
        batch_id: String,
        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Write the results of a finished batch, one file per row
    Results {
        /// Batch identifier
        #[arg(long)]
        batch_id: String,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Run the MCP workflow assistant on stdio
    Serve {
        /// Directory holding the workflow files (default: $PROMPTBATCH_DATA_DIR or cwd)
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// API key (default: $ANTHROPIC_API_KEY)
        #[arg(long)]
        api_key: Option<String>,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// Directory for result files
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Output encoding: utf-8, latin-1 or ascii
    #[arg(long)]
    encoding: Option<OutputEncoding>,
    /// Write UTF-8 when the output encoding cannot represent a response
    #[arg(long)]
    fallback: bool,
}

#[derive(Args)]
struct RemoteArgs {
    /// API key (default: $ANTHROPIC_API_KEY)
    #[arg(long)]
    api_key: Option<String>,
    /// Poll until the batch finishes
    #[arg(long)]
    wait: bool,
    /// Seconds between polls with --wait
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    poll_interval: u64,
}

impl RemoteArgs {
    fn wait_interval(&self) -> Option<Duration> {
        self.wait.then(|| Duration::from_secs(self.poll_interval))
    }
}

fn api_key(raw: Option<String>) -> Result<Option<ApiKey>, AppError> {
    raw.map(ApiKey::new).transpose()
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Entry point for the CLI.
pub fn run() {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    let result: Result<i32, AppError> = match cli.command {
        Commands::Submit { csv, system, template, model, max_tokens, temperature, output, remote } => {
            let overrides = api_key(remote.api_key.clone()).map(|api_key| RunOverrides {
                config: cli.config,
                api_key,
                model,
                max_tokens,
                temperature,
                system_prompt: system,
                template,
                variables: Some(csv),
                output_dir: output.output_dir,
                encoding: output.encoding,
                fallback: output.fallback,
                ..RunOverrides::default()
            });
            overrides.and_then(|overrides| run_submit(&overrides, &remote))
        }
        Commands::Status { batch_id, remote } => {
            let overrides = api_key(remote.api_key.clone())
                .map(|api_key| RunOverrides { config: cli.config, api_key, ..RunOverrides::default() });
            overrides.and_then(|overrides| run_status(&overrides, &batch_id, &remote))
        }
        Commands::Results { batch_id, output, remote } => {
            let overrides = api_key(remote.api_key.clone()).map(|api_key| RunOverrides {
                config: cli.config,
                api_key,
                output_dir: output.output_dir,
                encoding: output.encoding,
                fallback: output.fallback,
                ..RunOverrides::default()
            });
            overrides.and_then(|overrides| run_results(&overrides, &batch_id, &remote))
        }
        Commands::Serve { data_dir, api_key: key } => api_key(key).and_then(|api_key| {
            let overrides = RunOverrides { config: cli.config, api_key, ..RunOverrides::default() };
            let dir = api::data_dir(data_dir.as_deref())?;
            api::serve(&dir, &overrides).map(|_| 0)
        }),
    };

    match result {
        Ok(exit_code) => {
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }
        Err(e) if !e.is_fatal() => {
            eprintln!("{}", e);
            std::process::exit(EXIT_NOT_READY);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_submit(overrides: &RunOverrides, remote: &RemoteArgs) -> Result<i32, AppError> {
    let root = std::env::current_dir()?;
    let report = api::submit_at(&root, overrides)?;

    for row in &report.skipped {
        eprintln!("Skipped line {}: {}", row.line, row.error);
    }
    eprintln!("Submitted {} request(s)", report.manifest.rows.len());
    if !report.manifest_saved {
        eprintln!("Warning: no batch manifest was written; result files will be named by request id");
    }
    println!("{}", report.batch_id());

    if remote.wait {
        let fetched = api::fetch_at(&root, overrides, report.batch_id(), remote.wait_interval())?;
        print_fetch_summary(&fetched.summary_lines());
    }
    Ok(0)
}

fn run_status(overrides: &RunOverrides, batch_id: &str, remote: &RemoteArgs) -> Result<i32, AppError> {
    let status = api::status_at(std::env::current_dir()?, overrides, batch_id, remote.wait_interval())?;
    println!("{}", api::describe_status(&status));
    Ok(0)
}

fn run_results(overrides: &RunOverrides, batch_id: &str, remote: &RemoteArgs) -> Result<i32, AppError> {
    let report = api::fetch_at(std::env::current_dir()?, overrides, batch_id, remote.wait_interval())?;
    print_fetch_summary(&report.summary_lines());
    if !report.failed.is_empty() {
        eprintln!("{} row(s) produced no file", report.failed.len());
    }
    Ok(0)
}

fn print_fetch_summary(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}
