//! Message Batches API client implementation using reqwest.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::domain::{
    ApiKey, AppError, BatchApiConfig, BatchPhase, BatchRequestItem, BatchResultEntry, BatchStatus,
    RequestCounts, ResultOutcome,
};
use crate::domain::configuration::resolve_api_key;
use crate::ports::{BatchClient, BatchClientFactory};

const X_API_KEY: &str = "x-api-key";
const ANTHROPIC_VERSION: &str = "anthropic-version";
const NO_CONTENT: &str = "No content returned";

/// HTTP client for the Message Batches API.
#[derive(Clone)]
pub struct HttpBatchClient {
    api_key: ApiKey,
    batches_url: Url,
    anthropic_version: String,
    client: Client,
}

impl std::fmt::Debug for HttpBatchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBatchClient")
            .field("batches_url", &self.batches_url)
            .field("anthropic_version", &self.anthropic_version)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl HttpBatchClient {
    /// Create a new HTTP client with the given API key and configuration.
    pub fn new(api_key: ApiKey, config: &BatchApiConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            batches_url: config.batches_url()?,
            anthropic_version: config.anthropic_version.clone(),
            client,
        })
    }

    fn batch_url(&self, batch_id: &str) -> Result<Url, AppError> {
        let mut url = self.batches_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::InvalidConfig("base_url cannot be a base".into()))?
            .push(batch_id);
        Ok(url)
    }

    fn default_results_url(&self, batch_id: &str) -> Result<Url, AppError> {
        let mut url = self.batch_url(batch_id)?;
        url.path_segments_mut()
            .map_err(|_| AppError::InvalidConfig("base_url cannot be a base".into()))?
            .push("results");
        Ok(url)
    }

    fn get(&self, url: Url) -> Result<Response, reqwest::Error> {
        self.client
            .get(url)
            .header(X_API_KEY, self.api_key.expose())
            .header(ANTHROPIC_VERSION, &self.anthropic_version)
            .send()
    }
}

/// Creates [`HttpBatchClient`]s, resolving the API key at creation time.
#[derive(Debug, Clone)]
pub struct HttpBatchClientFactory {
    api_key: Option<ApiKey>,
    config: BatchApiConfig,
}

impl HttpBatchClientFactory {
    /// Without an explicit key, `ANTHROPIC_API_KEY` is read on each `create`.
    pub fn new(api_key: Option<ApiKey>, config: BatchApiConfig) -> Self {
        Self { api_key, config }
    }
}

impl BatchClientFactory for HttpBatchClientFactory {
    fn create(&self) -> Result<Box<dyn BatchClient>, AppError> {
        let api_key = match &self.api_key {
            Some(key) => key.clone(),
            None => resolve_api_key(None, |name| std::env::var(name).ok())?,
        };
        Ok(Box::new(HttpBatchClient::new(api_key, &self.config)?))
    }
}

#[derive(Debug, Serialize)]
struct CreateBatchRequest<'a> {
    requests: Vec<ApiRequest<'a>>,
}

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    custom_id: &'a str,
    params: ApiParams<'a>,
}

#[derive(Debug, Serialize)]
struct ApiParams<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    system: Vec<SystemBlock<'a>>,
    messages: Vec<ApiMessageParam<'a>>,
}

#[derive(Debug, Serialize)]
struct SystemBlock<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_control: Option<CacheControl>,
}

#[derive(Debug, Serialize)]
struct CacheControl {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ApiMessageParam<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a BatchRequestItem> for ApiRequest<'a> {
    fn from(item: &'a BatchRequestItem) -> Self {
        let system = if item.system.is_empty() {
            Vec::new()
        } else {
            vec![SystemBlock {
                kind: "text",
                text: &item.system.text,
                cache_control: item.system.cacheable.then_some(CacheControl { kind: "ephemeral" }),
            }]
        };

        ApiRequest {
            custom_id: &item.custom_id,
            params: ApiParams {
                model: &item.params.model,
                max_tokens: item.params.max_tokens,
                temperature: item.params.temperature,
                system,
                messages: vec![ApiMessageParam { role: "user", content: &item.prompt }],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiBatch {
    id: String,
    processing_status: String,
    #[serde(default)]
    request_counts: RequestCounts,
    #[serde(default)]
    results_url: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    ended_at: Option<DateTime<Utc>>,
}

impl ApiBatch {
    fn into_status(self, phase: Option<BatchPhase>) -> Result<BatchStatus, AppError> {
        let phase = match phase {
            Some(phase) => phase,
            None => BatchPhase::from_remote(&self.processing_status, &self.request_counts)?,
        };
        let results_url = match self.results_url {
            Some(raw) => Some(Url::parse(&raw).map_err(|e| AppError::ParseError {
                what: "results_url".into(),
                details: e.to_string(),
            })?),
            None => None,
        };
        Ok(BatchStatus {
            id: self.id,
            phase,
            processing_status: self.processing_status,
            counts: self.request_counts,
            results_url,
            created_at: self.created_at,
            ended_at: self.ended_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiResultLine {
    #[serde(alias = "id")]
    custom_id: String,
    result: ApiResult,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiResult {
    Succeeded {
        message: ApiMessage,
    },
    Errored {
        #[serde(default)]
        error: Value,
    },
    Canceled,
    Expired,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: Vec<ApiContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ApiContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Concatenated text blocks of a message.
fn message_text(message: ApiMessage) -> String {
    let text: String = message
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect();
    if text.is_empty() { NO_CONTENT.to_string() } else { text }
}

/// Best-effort message from an error payload, which nests as
/// `{"type": "error", "error": {"type": ..., "message": ...}}`.
fn error_message(error: &Value) -> String {
    if let Some(message) = error.get("message").and_then(Value::as_str) {
        return message.to_string();
    }
    if let Some(inner) = error.get("error") {
        return error_message(inner);
    }
    if error.is_null() { "Unknown error".to_string() } else { error.to_string() }
}

/// Parse the JSONL results stream.
///
/// A line that does not decode becomes an `Errored` entry, keyed by its
/// `custom_id` when one can be read and by `line_<n>` otherwise.
pub(crate) fn parse_results(body: &str) -> Vec<BatchResultEntry> {
    let mut entries = Vec::new();
    for (index, line) in body.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let parsed: ApiResultLine = match serde_json::from_str(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                let line_number = index + 1;
                tracing::warn!(line = line_number, error = %e, "Malformed results line");
                entries.push(malformed_entry(line, line_number, &e));
                continue;
            }
        };
        let outcome = match parsed.result {
            ApiResult::Succeeded { message } => ResultOutcome::Succeeded(message_text(message)),
            ApiResult::Errored { error } => ResultOutcome::Errored(error_message(&error)),
            ApiResult::Canceled => ResultOutcome::Canceled,
            ApiResult::Expired => ResultOutcome::Expired,
        };
        entries.push(BatchResultEntry { custom_id: parsed.custom_id, outcome });
    }
    entries
}

fn malformed_entry(line: &str, line_number: usize, error: &serde_json::Error) -> BatchResultEntry {
    let custom_id = serde_json::from_str::<Value>(line)
        .ok()
        .and_then(|value| {
            let id = value.get("custom_id").or_else(|| value.get("id"))?;
            id.as_str().map(str::to_string)
        })
        .unwrap_or_else(|| format!("line_{}", line_number));
    BatchResultEntry {
        custom_id,
        outcome: ResultOutcome::Errored(format!("malformed result on line {}: {}", line_number, error)),
    }
}

fn api_error(response: Response) -> String {
    let status = response.status().as_u16();
    let body = response.text().unwrap_or_else(|_| "Unknown error".to_string());
    let detail = serde_json::from_str::<Value>(&body).map(|v| error_message(&v)).unwrap_or(body);
    format!("API error ({}): {}", status, detail)
}

impl BatchClient for HttpBatchClient {
    fn create_batch(&self, items: &[BatchRequestItem]) -> Result<BatchStatus, AppError> {
        let body = CreateBatchRequest { requests: items.iter().map(ApiRequest::from).collect() };
        tracing::debug!(requests = items.len(), url = %self.batches_url, "creating message batch");

        let response = self
            .client
            .post(self.batches_url.clone())
            .header(X_API_KEY, self.api_key.expose())
            .header(ANTHROPIC_VERSION, &self.anthropic_version)
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .map_err(|e| AppError::Submission(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Submission(api_error(response)));
        }

        let batch: ApiBatch = response
            .json()
            .map_err(|e| AppError::Submission(format!("Failed to parse response: {}", e)))?;
        batch.into_status(Some(BatchPhase::Submitted))
    }

    fn retrieve_batch(&self, batch_id: &str) -> Result<BatchStatus, AppError> {
        let url = self.batch_url(batch_id)?;
        tracing::debug!(%url, "retrieving message batch");

        let response =
            self.get(url).map_err(|e| AppError::Remote(format!("HTTP request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(AppError::Remote(api_error(response)));
        }

        let batch: ApiBatch = response
            .json()
            .map_err(|e| AppError::Remote(format!("Failed to parse response: {}", e)))?;
        batch.into_status(None)
    }

    fn batch_results(&self, status: &BatchStatus) -> Result<Vec<BatchResultEntry>, AppError> {
        let url = match &status.results_url {
            Some(url) => url.clone(),
            None => self.default_results_url(&status.id)?,
        };
        tracing::debug!(%url, "downloading batch results");

        let response =
            self.get(url).map_err(|e| AppError::Remote(format!("HTTP request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(AppError::Remote(api_error(response)));
        }

        let body = response
            .text()
            .map_err(|e| AppError::Remote(format!("Failed to read results: {}", e)))?;
        Ok(parse_results(&body))
    }
}
