//! Gonggo LLM Provider Layer
//!
//! Pluggable language model providers for the model-backed extraction tiers.
//!
//! # Architecture
//!
//! This crate provides implementations of the `LlmProvider` trait from `gonggo-domain`.
//! Every provider reports token usage alongside the generated text so the
//! pipeline can estimate cost per call.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OllamaProvider`: Local Ollama API integration
//! - `OpenAiProvider`: OpenAI-compatible chat completions API
//! - `AnthropicProvider`: Anthropic messages API
//! - `ConfiguredProvider`: one of the above, chosen from configuration
//!
//! # Examples
//!
//! ```
//! use gonggo_llm::MockProvider;
//! use gonggo_domain::traits::LlmProvider;
//!
//! let provider = MockProvider::new(r#"{"deadline": "2025-03-15"}"#);
//! let completion = provider.complete("test prompt").unwrap();
//! assert_eq!(completion.text, r#"{"deadline": "2025-03-15"}"#);
//! ```

#![warn(missing_docs)]

pub mod anthropic;
pub mod config;
mod http;
pub mod ollama;
pub mod openai;

use gonggo_domain::traits::{Completion, LlmProvider};
use gonggo_domain::TokenUsage;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use anthropic::AnthropicProvider;
pub use config::{ConfiguredProvider, ProviderConfig, ProviderKind};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Provider misconfigured (missing key, bad endpoint)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Run an async provider call to completion from a blocking context
///
/// The pipeline calls providers from the blocking thread pool, so a
/// current-thread runtime per call is safe here.
pub(crate) fn block_on<F: std::future::Future>(future: F) -> Result<F::Output, LlmError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| LlmError::Other(format!("Failed to start runtime: {}", e)))?;
    Ok(runtime.block_on(future))
}

/// Rough token estimate (4 characters per token) for providers that do not
/// report usage
pub fn estimate_tokens(text: &str) -> u64 {
    let chars = text.chars().count() as u64;
    chars.div_ceil(4)
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Error,
}

/// Mock LLM provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls.
/// Rules match when the prompt *contains* the configured key, checked in
/// insertion order; the default response is used otherwise.
///
/// # Examples
///
/// ```
/// use gonggo_llm::MockProvider;
/// use gonggo_domain::traits::LlmProvider;
///
/// // Simple fixed response
/// let provider = MockProvider::new("Fixed response");
/// assert_eq!(provider.complete("any prompt").unwrap().text, "Fixed response");
///
/// // Responses keyed by prompt content
/// let mut provider = MockProvider::default();
/// provider.add_response("Operations/Dates", "dates");
/// provider.add_response("Eligibility", "eligibility");
/// assert_eq!(provider.complete("... Operations/Dates ...").unwrap().text, "dates");
/// assert_eq!(provider.complete("... Eligibility ...").unwrap().text, "eligibility");
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    model: String,
    default_response: String,
    rules: Arc<Mutex<Vec<(String, MockReply)>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    usage: Option<TokenUsage>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            model: "mock".to_string(),
            default_response: response.into(),
            rules: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            usage: None,
        }
    }

    /// Set the model name reported as result source
    pub fn with_model_name(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Report a fixed token usage for every call instead of an estimate
    pub fn with_usage(mut self, input_tokens: u64, output_tokens: u64) -> Self {
        self.usage = Some(TokenUsage::new(input_tokens, output_tokens));
        self
    }

    /// Add a response for prompts containing `key`
    pub fn add_response(&mut self, key: impl Into<String>, response: impl Into<String>) {
        lock(&self.rules).push((key.into(), MockReply::Text(response.into())));
    }

    /// Fail every prompt containing `key`
    pub fn add_error(&mut self, key: impl Into<String>) {
        lock(&self.rules).push((key.into(), MockReply::Error));
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    /// Reset the call history
    pub fn reset_call_count(&self) {
        lock(&self.prompts).clear();
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("{}")
    }
}

impl LlmProvider for MockProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        &self.model
    }

    fn complete(&self, prompt: &str) -> Result<Completion, Self::Error> {
        lock(&self.prompts).push(prompt.to_string());

        let reply = lock(&self.rules)
            .iter()
            .find(|(key, _)| prompt.contains(key.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| MockReply::Text(self.default_response.clone()));

        match reply {
            MockReply::Error => Err(LlmError::Other("Mock error".to_string())),
            MockReply::Text(text) => {
                let usage = self.usage.unwrap_or_else(|| {
                    TokenUsage::new(estimate_tokens(prompt), estimate_tokens(&text))
                });
                Ok(Completion::new(text, usage))
            }
        }
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
