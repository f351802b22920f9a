//! Batch request items.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// System prompt shared by every request in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPrompt {
    pub text: String,
    /// Ask the provider to cache the processed system block across requests.
    pub cacheable: bool,
}

impl SystemPrompt {
    pub fn new(text: impl Into<String>, cacheable: bool) -> Self {
        Self { text: text.into(), cacheable }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Per-run generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationParams {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

pub(crate) fn default_model() -> String {
    "claude-3-opus-20240229".to_string()
}

pub(crate) fn default_max_tokens() -> u32 {
    4000
}

pub(crate) fn default_temperature() -> f32 {
    0.2
}

/// One templated request, consumed once by the submitter.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRequestItem {
    /// Identifier echoed back by the provider in the results.
    pub custom_id: String,
    /// Human-readable row name used for the output file.
    pub title: String,
    pub prompt: String,
    pub system: Arc<SystemPrompt>,
    pub params: GenerationParams,
}

/// Identifier the provider echoes back for the row at `index`.
pub fn custom_id_for(index: usize) -> String {
    format!("request_{}", index)
}

/// Combine a finished prompt with the system prompt and parameters.
pub fn build_request(
    index: usize,
    title: impl Into<String>,
    prompt: String,
    system: &Arc<SystemPrompt>,
    params: &GenerationParams,
) -> BatchRequestItem {
    BatchRequestItem {
        custom_id: custom_id_for(index),
        title: title.into(),
        prompt,
        system: Arc::clone(system),
        params: params.clone(),
    }
}
