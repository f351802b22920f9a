pub mod loader;
pub mod run_config;

pub use loader::{apply_env_overrides, load_config, parse_config_content, resolve_api_key};
pub use run_config::{ApiKey, BatchApiConfig, OutputConfig, PromptConfig, RunConfig, RunPaths};
