//! API facade for the application.
//!
//! Builds the concrete store, configuration and HTTP client for a working
//! directory, then runs the requested command.

use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::app::AppContext;
use crate::app::commands::{fetch, status, submit, wait};
use crate::app::mcp::{McpServer, ToolHandlers};
use crate::domain::configuration::{apply_env_overrides, resolve_api_key};
use crate::domain::{
    ApiKey, AppError, BatchStatus, FetchReport, OutputEncoding, RunConfig, SubmitReport,
    load_config,
};
use crate::services::{FilesystemStore, HttpBatchClient, HttpBatchClientFactory};

pub use crate::app::commands::status::describe as describe_status;

/// Environment variable naming the MCP server's data directory.
pub const ENV_DATA_DIR: &str = "PROMPTBATCH_DATA_DIR";

/// Values given on the command line; each one, when set, wins over the
/// configuration file and the environment.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub config: Option<PathBuf>,
    pub api_key: Option<ApiKey>,
    pub base_url: Option<Url>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub system_prompt: Option<PathBuf>,
    pub template: Option<PathBuf>,
    pub variables: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub encoding: Option<OutputEncoding>,
    pub fallback: bool,
}

impl RunOverrides {
    fn apply(&self, config: &mut RunConfig) {
        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.clone();
        }
        if let Some(model) = &self.model {
            config.generation.model = model.clone();
        }
        if let Some(max_tokens) = self.max_tokens {
            config.generation.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.generation.temperature = temperature;
        }
        if let Some(path) = &self.system_prompt {
            config.paths.system_prompt = path.clone();
        }
        if let Some(path) = &self.template {
            config.paths.template = path.clone();
        }
        if let Some(path) = &self.variables {
            config.paths.variables = path.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(encoding) = self.encoding {
            config.output.encoding = encoding;
        }
        if self.fallback {
            config.output.fallback = true;
        }
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Resolve the effective configuration: defaults, file, environment, flags.
pub fn resolve_config(store: &FilesystemStore, overrides: &RunOverrides) -> Result<RunConfig, AppError> {
    let mut config = load_config(store, overrides.config.as_deref())?;
    apply_env_overrides(&mut config, env_lookup)?;
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn http_client(config: &RunConfig, overrides: &RunOverrides) -> Result<HttpBatchClient, AppError> {
    let api_key = match &overrides.api_key {
        Some(key) => key.clone(),
        None => resolve_api_key(None, env_lookup)?,
    };
    HttpBatchClient::new(api_key, &config.api)
}

/// Submit the configured inputs from `root` as one batch.
pub fn submit_at(root: impl Into<PathBuf>, overrides: &RunOverrides) -> Result<SubmitReport, AppError> {
    let store = FilesystemStore::new(root.into());
    let config = resolve_config(&store, overrides)?;
    let client = http_client(&config, overrides)?;
    submit::execute(&AppContext::new(store, config), &client)
}

/// Query a batch once, or until it finishes when `wait` is set.
pub fn status_at(
    root: impl Into<PathBuf>,
    overrides: &RunOverrides,
    batch_id: &str,
    wait: Option<Duration>,
) -> Result<BatchStatus, AppError> {
    let store = FilesystemStore::new(root.into());
    let config = resolve_config(&store, overrides)?;
    let client = http_client(&config, overrides)?;
    match wait {
        Some(interval) => wait::until_terminal(&client, batch_id, interval, std::thread::sleep),
        None => status::execute(&client, batch_id),
    }
}

/// Fetch the results of a batch into the output directory under `root`.
///
/// With `wait`, polls until the batch finishes before fetching.
pub fn fetch_at(
    root: impl Into<PathBuf>,
    overrides: &RunOverrides,
    batch_id: &str,
    wait: Option<Duration>,
) -> Result<FetchReport, AppError> {
    let store = FilesystemStore::new(root.into());
    let config = resolve_config(&store, overrides)?;
    let client = http_client(&config, overrides)?;
    if let Some(interval) = wait {
        wait::until_terminal(&client, batch_id, interval, std::thread::sleep)?;
    }
    fetch::execute(&AppContext::new(store, config), &client, batch_id, overrides.fallback)
}

/// Data directory for the MCP server: the flag, then `PROMPTBATCH_DATA_DIR`,
/// then the current directory.
pub fn data_dir(explicit: Option<&Path>) -> Result<PathBuf, AppError> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    match env_lookup(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => Ok(std::env::current_dir()?),
    }
}

/// Run the MCP server on stdio with files confined to `data_dir`.
///
/// The API key is resolved when a tool first needs the remote API, so the
/// server starts without one.
pub fn serve(data_dir: &Path, overrides: &RunOverrides) -> Result<(), AppError> {
    std::fs::create_dir_all(data_dir)?;
    let root = data_dir.canonicalize()?;
    let store = FilesystemStore::confined(root.clone());
    let config = resolve_config(&store, overrides)?;
    let clients = HttpBatchClientFactory::new(overrides.api_key.clone(), config.api.clone());

    tracing::info!(data_dir = %root.display(), "Serving MCP over stdio");
    let server = McpServer::new(ToolHandlers::new(AppContext::new(store, config), clients));
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    server.run(stdin.lock(), stdout.lock())
}
