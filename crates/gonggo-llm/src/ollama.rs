//! Ollama Provider Implementation
//!
//! Provides integration with Ollama's local LLM API, useful for running the
//! cheap extraction tier on local hardware at zero marginal cost.
//!
//! # Features
//!
//! - Async HTTP communication with Ollama API
//! - JSON output mode
//! - Token counts from `prompt_eval_count` / `eval_count`
//! - Retry logic with exponential backoff
//!
//! # Examples
//!
//! ```no_run
//! use gonggo_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "qwen2.5:7b");
//! ```

use crate::http::send_with_retry;
use crate::{block_on, estimate_tokens, LlmError};
use gonggo_domain::traits::{Completion, LlmProvider};
use gonggo_domain::TokenUsage;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for LLM requests (120 seconds; local models are slow)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default number of retry attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Ollama API provider for local LLM inference
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
    max_retries: u32,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'static str,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Response from Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Model to use (e.g., "qwen2.5:7b")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_timeout(endpoint, model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a provider with an explicit request timeout
    pub fn with_timeout(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Create a new Ollama provider on `http://localhost:11434`
    pub fn default_endpoint(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Set the maximum number of retry attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Generate a completion using the Ollama API
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Ollama is not running
    /// - Model is not available
    /// - Network communication fails
    /// - Response format is invalid
    pub async fn generate(&self, prompt: &str) -> Result<Completion, LlmError> {
        let url = format!("{}/api/generate", self.endpoint);

        let request_body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            format: "json",
            options: OllamaOptions { temperature: 0.0 },
        };

        let body = send_with_retry(
            || self.client.post(&url).json(&request_body),
            &self.model,
            self.max_retries,
        )
        .await?;

        parse_generate_response(&body, prompt)
    }
}

fn parse_generate_response(body: &str, prompt: &str) -> Result<Completion, LlmError> {
    let response: OllamaGenerateResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    let usage = TokenUsage::new(
        response
            .prompt_eval_count
            .unwrap_or_else(|| estimate_tokens(prompt)),
        response
            .eval_count
            .unwrap_or_else(|| estimate_tokens(&response.response)),
    );

    Ok(Completion::new(response.response, usage))
}

impl LlmProvider for OllamaProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.model
    }

    fn complete(&self, prompt: &str) -> Result<Completion, Self::Error> {
        // Blocking wrapper for async function
        block_on(self.generate(prompt))?
    }
}
