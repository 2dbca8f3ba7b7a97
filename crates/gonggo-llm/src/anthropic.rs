//! Anthropic provider using the `/v1/messages` API
//!
//! Typically serves the escalation tier with a high-capability model.

use crate::http::send_with_retry;
use crate::{block_on, LlmError};
use gonggo_domain::traits::{Completion, LlmProvider};
use gonggo_domain::TokenUsage;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default API base
pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com";

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default completion budget; the escalation response carries reasoning and
/// suggestions, so it is larger than a flat field map
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Default timeout for requests
pub const DEFAULT_TIMEOUT_SECS: u64 = 180;

/// Default number of retry attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Anthropic messages API provider
pub struct AnthropicProvider {
    endpoint: String,
    model: String,
    api_key: String,
    max_tokens: u32,
    client: reqwest::Client,
    max_retries: u32,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: MessagesUsage,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct MessagesUsage {
    input_tokens: u64,
    output_tokens: u64,
}

impl AnthropicProvider {
    /// Create a provider for `model` authenticated with `api_key`
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self::with_timeout(endpoint, model, api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a provider with an explicit request timeout
    pub fn with_timeout(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Set the completion token budget
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the maximum number of retry attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Generate a completion
    pub async fn generate(&self, prompt: &str) -> Result<Completion, LlmError> {
        let url = format!("{}/v1/messages", self.endpoint);
        let request_body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let body = send_with_retry(
            || {
                self.client
                    .post(&url)
                    .header("x-api-key", &self.api_key)
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .json(&request_body)
            },
            &self.model,
            self.max_retries,
        )
        .await?;

        parse_messages_response(&body)
    }
}

fn parse_messages_response(body: &str) -> Result<Completion, LlmError> {
    let response: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    let text: String = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join("");

    if text.is_empty() {
        return Err(LlmError::InvalidResponse("Response has no text content".to_string()));
    }

    Ok(Completion::new(
        text,
        TokenUsage::new(response.usage.input_tokens, response.usage.output_tokens),
    ))
}

impl LlmProvider for AnthropicProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.model
    }

    fn complete(&self, prompt: &str) -> Result<Completion, Self::Error> {
        block_on(self.generate(prompt))?
    }
}
