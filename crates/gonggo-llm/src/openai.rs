//! OpenAI-compatible chat completions provider
//!
//! Works against the OpenAI API and any gateway exposing the same
//! `/v1/chat/completions` contract. Typically serves the cheap tier with a
//! small model.

use crate::http::send_with_retry;
use crate::{block_on, estimate_tokens, LlmError};
use gonggo_domain::traits::{Completion, LlmProvider};
use gonggo_domain::TokenUsage;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default API base
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com";

/// Default timeout for requests
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default number of retry attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// OpenAI-compatible chat completions provider
pub struct OpenAiProvider {
    endpoint: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
    max_retries: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

impl OpenAiProvider {
    /// Create a provider for `model` at `endpoint` authenticated with `api_key`
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
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Set the maximum number of retry attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Generate a completion
    pub async fn generate(&self, prompt: &str) -> Result<Completion, LlmError> {
        let url = format!("{}/v1/chat/completions", self.endpoint);
        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let body = send_with_retry(
            || {
                self.client
                    .post(&url)
                    .bearer_auth(&self.api_key)
                    .json(&request_body)
            },
            &self.model,
            self.max_retries,
        )
        .await?;

        parse_chat_response(&body, prompt)
    }
}

fn parse_chat_response(body: &str, prompt: &str) -> Result<Completion, LlmError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| LlmError::InvalidResponse("Response has no message content".to_string()))?;

    let usage = match response.usage {
        Some(u) => TokenUsage::new(u.prompt_tokens, u.completion_tokens),
        None => TokenUsage::new(estimate_tokens(prompt), estimate_tokens(&text)),
    };

    Ok(Completion::new(text, usage))
}

impl LlmProvider for OpenAiProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.model
    }

    fn complete(&self, prompt: &str) -> Result<Completion, Self::Error> {
        block_on(self.generate(prompt))?
    }
}
