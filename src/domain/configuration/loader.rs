//! Run configuration loading: file, then environment.

use std::path::Path;

use url::Url;

use crate::domain::{AppError, ApiKey, RunConfig};
use crate::ports::RunStore;

/// Default configuration file name, looked up in the store root.
pub const CONFIG_FILE: &str = "promptbatch.toml";

pub const ENV_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_BASE_URL: &str = "ANTHROPIC_BASE_URL";
pub const ENV_MODEL: &str = "MODEL";
pub const ENV_MAX_TOKENS: &str = "MAX_TOKENS";
pub const ENV_TEMPERATURE: &str = "TEMPERATURE";
pub const ENV_OUTPUT_ENCODING: &str = "OUTPUT_ENCODING";

/// Load the run configuration.
///
/// With an explicit `path` the file must exist. Without one, `promptbatch.toml`
/// is read when present and defaults are used otherwise.
pub fn load_config(store: &impl RunStore, path: Option<&Path>) -> Result<RunConfig, AppError> {
    let (config_path, required) = match path {
        Some(path) => (path, true),
        None => (Path::new(CONFIG_FILE), false),
    };

    if !store.file_exists(config_path) {
        if required {
            return Err(AppError::missing("Configuration", config_path.display().to_string()));
        }
        return Ok(RunConfig::default());
    }

    let content = store.read_file(config_path)?;
    parse_config_content(&content)
}

/// Parse configuration from string content.
pub fn parse_config_content(content: &str) -> Result<RunConfig, AppError> {
    let config: RunConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` abstracts `std::env::var` so tests need not mutate the process
/// environment. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut RunConfig, lookup: F) -> Result<(), AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(model) = get(ENV_MODEL) {
        config.generation.model = model;
    }
    if let Some(raw) = get(ENV_MAX_TOKENS) {
        config.generation.max_tokens = raw.trim().parse().map_err(|e| AppError::ParseError {
            what: ENV_MAX_TOKENS.into(),
            details: format!("{} ({})", raw, e),
        })?;
    }
    if let Some(raw) = get(ENV_TEMPERATURE) {
        config.generation.temperature = raw.trim().parse().map_err(|e| AppError::ParseError {
            what: ENV_TEMPERATURE.into(),
            details: format!("{} ({})", raw, e),
        })?;
    }
    if let Some(raw) = get(ENV_OUTPUT_ENCODING) {
        config.output.encoding = raw
            .parse()
            .map_err(|details| AppError::ParseError { what: ENV_OUTPUT_ENCODING.into(), details })?;
    }
    if let Some(raw) = get(ENV_BASE_URL) {
        config.api.base_url = Url::parse(raw.trim()).map_err(|e| AppError::ParseError {
            what: ENV_BASE_URL.into(),
            details: e.to_string(),
        })?;
    }
    Ok(())
}

/// Resolve the API key: explicit value first, then `ANTHROPIC_API_KEY`.
pub fn resolve_api_key<F>(explicit: Option<&str>, lookup: F) -> Result<ApiKey, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = explicit {
        return ApiKey::new(key);
    }
    match lookup(ENV_API_KEY) {
        Some(key) if !key.trim().is_empty() => ApiKey::new(key),
        _ => Err(AppError::Configuration(format!(
            "API key not found. Provide --api-key, set {} or add it to a .env file.",
            ENV_API_KEY
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::domain::OutputEncoding;
    use crate::testing::MemoryRunStore;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn run_config_parses_from_toml() {
        let content = r#"
[api]
timeout_secs = 5

[generation]
model = "claude-3-5-haiku-latest"
max_tokens = 1024

[output]
encoding = "ascii"
fallback = true
dir = "out"
"#;
        let config = parse_config_content(content).unwrap();
        assert_eq!(config.api.timeout_secs, 5);
        assert_eq!(config.generation.model, "claude-3-5-haiku-latest");
        assert_eq!(config.generation.max_tokens, 1024);
        assert!((config.generation.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.output.encoding, OutputEncoding::Ascii);
        assert!(config.output.fallback);
        assert_eq!(config.output.dir, Path::new("out"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = parse_config_content("[generation]\nmodle = \"x\"\n").unwrap_err();
        assert!(matches!(err, AppError::TomlParseError(_)));
    }

    #[test]
    fn missing_default_file_yields_defaults() {
        let store = MemoryRunStore::new();
        let config = load_config(&store, None).unwrap();
        assert_eq!(config.generation.max_tokens, 4000);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let store = MemoryRunStore::new();
        let err = load_config(&store, Some(Path::new("custom.toml"))).unwrap_err();
        assert!(matches!(err, AppError::ConfigurationMissing { .. }));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = parse_config_content("[generation]\nmax_tokens = 10\n").unwrap();
        apply_env_overrides(
            &mut config,
            env(&[
                (ENV_MAX_TOKENS, "2048"),
                (ENV_TEMPERATURE, "0.7"),
                (ENV_MODEL, "claude-sonnet"),
                (ENV_OUTPUT_ENCODING, "latin-1"),
            ]),
        )
        .unwrap();

        assert_eq!(config.generation.max_tokens, 2048);
        assert!((config.generation.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.generation.model, "claude-sonnet");
        assert_eq!(config.output.encoding, OutputEncoding::Latin1);
    }

    #[test]
    fn malformed_env_value_is_reported() {
        let mut config = RunConfig::default();
        let err = apply_env_overrides(&mut config, env(&[(ENV_MAX_TOKENS, "lots")])).unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"));
    }

    #[test]
    fn api_key_prefers_explicit_value() {
        let key = resolve_api_key(Some("from-flag"), env(&[(ENV_API_KEY, "from-env")])).unwrap();
        assert_eq!(key.expose(), "from-flag");

        let key = resolve_api_key(None, env(&[(ENV_API_KEY, "from-env")])).unwrap();
        assert_eq!(key.expose(), "from-env");

        assert!(resolve_api_key(None, env(&[])).is_err());
    }
}
