use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::{AppError, GenerationParams, OutputEncoding};

/// Run configuration loaded from `promptbatch.toml`, the environment and flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Batch API endpoint settings.
    #[serde(default)]
    pub api: BatchApiConfig,
    /// Model, token limit and temperature for every request.
    #[serde(default)]
    pub generation: GenerationParams,
    /// System prompt handling.
    #[serde(default)]
    pub prompt: PromptConfig,
    /// Result file settings.
    #[serde(default)]
    pub output: OutputConfig,
    /// Locations of the files the workflow reads and writes.
    #[serde(default)]
    pub paths: RunPaths,
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        self.api.validate()?;
        validate_generation(&self.generation)?;
        Ok(())
    }
}

fn validate_generation(params: &GenerationParams) -> Result<(), AppError> {
    if params.model.trim().is_empty() {
        return Err(AppError::InvalidConfig("model must not be empty".to_string()));
    }
    if params.max_tokens == 0 {
        return Err(AppError::InvalidConfig("max_tokens must be greater than 0".to_string()));
    }
    if !(0.0..=1.0).contains(&params.temperature) {
        return Err(AppError::InvalidConfig(format!(
            "temperature must be between 0.0 and 1.0, got {}",
            params.temperature
        )));
    }
    Ok(())
}

/// Batch API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchApiConfig {
    /// API base URL; batch endpoints are resolved against it.
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Value of the `anthropic-version` header.
    #[serde(default = "default_anthropic_version")]
    pub anthropic_version: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for BatchApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            anthropic_version: default_anthropic_version(),
            timeout_secs: default_timeout(),
        }
    }
}

impl BatchApiConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.timeout_secs == 0 {
            return Err(AppError::InvalidConfig("timeout_secs must be greater than 0".to_string()));
        }
        if self.anthropic_version.trim().is_empty() {
            return Err(AppError::InvalidConfig("anthropic_version must not be empty".to_string()));
        }
        Ok(())
    }

    /// `.../messages/batches`, tolerating a base URL with or without a
    /// trailing slash.
    pub fn batches_url(&self) -> Result<Url, AppError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join("messages/batches")
            .map_err(|e| AppError::InvalidConfig(format!("invalid base_url: {}", e)))
    }
}

fn default_base_url() -> Url {
    Url::parse("https://api.anthropic.com/v1/").expect("Default API URL must be valid")
}

fn default_anthropic_version() -> String {
    "2023-06-01".to_string()
}

fn default_timeout() -> u64 {
    60
}

/// System prompt configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromptConfig {
    /// Mark the system block cacheable by the provider.
    #[serde(default = "default_true")]
    pub cache_system_prompt: bool,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self { cache_system_prompt: default_true() }
    }
}

fn default_true() -> bool {
    true
}

/// Result file configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Encoding for the primary write path.
    #[serde(default)]
    pub encoding: OutputEncoding,
    /// Write UTF-8 when the primary encoding cannot represent the text.
    #[serde(default)]
    pub fallback: bool,
    /// Directory for result files and batch manifests.
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { encoding: OutputEncoding::default(), fallback: false, dir: default_output_dir() }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("responses")
}

/// Workflow file locations, relative to the store root unless absolute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunPaths {
    #[serde(default = "default_system_prompt_path")]
    pub system_prompt: PathBuf,
    #[serde(default = "default_template_path")]
    pub template: PathBuf,
    #[serde(default = "default_variables_path")]
    pub variables: PathBuf,
}

impl Default for RunPaths {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt_path(),
            template: default_template_path(),
            variables: default_variables_path(),
        }
    }
}

fn default_system_prompt_path() -> PathBuf {
    PathBuf::from("system_prompt.txt")
}

fn default_template_path() -> PathBuf {
    PathBuf::from("template.txt")
}

fn default_variables_path() -> PathBuf {
    PathBuf::from("variables.csv")
}

/// Static API key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Result<Self, AppError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(AppError::Configuration("API key must not be empty".into()));
        }
        Ok(Self(key))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}
