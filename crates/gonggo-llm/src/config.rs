//! Provider selection from configuration

use crate::{AnthropicProvider, LlmError, MockProvider, OllamaProvider, OpenAiProvider};
use gonggo_domain::traits::{Completion, LlmProvider};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which provider backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Deterministic mock (returns `{}` unless configured)
    Mock,
    /// Local Ollama
    Ollama,
    /// OpenAI-compatible chat completions
    OpenAi,
    /// Anthropic messages API
    Anthropic,
}

/// Provider settings, typically one block per model tier in the config file
///
/// ```toml
/// [tier2_provider]
/// kind = "openai"
/// model = "gpt-4o-mini"
/// api_key_env = "OPENAI_API_KEY"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Backend
    pub kind: ProviderKind,

    /// Model identifier
    pub model: String,

    /// API base URL; the backend default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Name of the environment variable holding the API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry attempts per call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    3
}

impl ProviderConfig {
    /// Default cheap-tier provider: a small OpenAI model
    pub fn small_default() -> Self {
        Self {
            kind: ProviderKind::OpenAi,
            model: "gpt-4o-mini".to_string(),
            endpoint: None,
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            timeout_secs: 60,
            max_retries: default_max_retries(),
        }
    }

    /// Default escalation-tier provider: a large Anthropic model
    pub fn large_default() -> Self {
        Self {
            kind: ProviderKind::Anthropic,
            model: "claude-opus-4-1".to_string(),
            endpoint: None,
            api_key_env: Some("ANTHROPIC_API_KEY".to_string()),
            timeout_secs: 180,
            max_retries: default_max_retries(),
        }
    }

    fn api_key(&self) -> Result<String, LlmError> {
        let var = self.api_key_env.as_deref().ok_or_else(|| {
            LlmError::Config(format!("{:?} provider requires api_key_env", self.kind))
        })?;
        std::env::var(var)
            .map_err(|_| LlmError::Config(format!("Environment variable {} is not set", var)))
    }
}

/// A provider chosen at runtime from [`ProviderConfig`]
pub enum ConfiguredProvider {
    /// Mock backend
    Mock(MockProvider),
    /// Ollama backend
    Ollama(OllamaProvider),
    /// OpenAI-compatible backend
    OpenAi(OpenAiProvider),
    /// Anthropic backend
    Anthropic(AnthropicProvider),
}

impl ConfiguredProvider {
    /// Build the provider described by `config`
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Config`] when a required API key is missing.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, LlmError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let provider = match config.kind {
            ProviderKind::Mock => {
                ConfiguredProvider::Mock(MockProvider::default().with_model_name(&config.model))
            }
            ProviderKind::Ollama => {
                let endpoint = config
                    .endpoint
                    .clone()
                    .unwrap_or_else(|| crate::ollama::DEFAULT_ENDPOINT.to_string());
                ConfiguredProvider::Ollama(
                    OllamaProvider::with_timeout(endpoint, &config.model, timeout)
                        .with_max_retries(config.max_retries),
                )
            }
            ProviderKind::OpenAi => {
                let endpoint = config
                    .endpoint
                    .clone()
                    .unwrap_or_else(|| crate::openai::DEFAULT_ENDPOINT.to_string());
                ConfiguredProvider::OpenAi(
                    OpenAiProvider::with_timeout(endpoint, &config.model, config.api_key()?, timeout)
                        .with_max_retries(config.max_retries),
                )
            }
            ProviderKind::Anthropic => {
                let endpoint = config
                    .endpoint
                    .clone()
                    .unwrap_or_else(|| crate::anthropic::DEFAULT_ENDPOINT.to_string());
                ConfiguredProvider::Anthropic(
                    AnthropicProvider::with_timeout(
                        endpoint,
                        &config.model,
                        config.api_key()?,
                        timeout,
                    )
                    .with_max_retries(config.max_retries),
                )
            }
        };
        Ok(provider)
    }
}

impl LlmProvider for ConfiguredProvider {
    type Error = LlmError;

    fn model_name(&self) -> &str {
        match self {
            ConfiguredProvider::Mock(p) => p.model_name(),
            ConfiguredProvider::Ollama(p) => p.model_name(),
            ConfiguredProvider::OpenAi(p) => p.model_name(),
            ConfiguredProvider::Anthropic(p) => p.model_name(),
        }
    }

    fn complete(&self, prompt: &str) -> Result<Completion, Self::Error> {
        match self {
            ConfiguredProvider::Mock(p) => p.complete(prompt),
            ConfiguredProvider::Ollama(p) => p.complete(prompt),
            ConfiguredProvider::OpenAi(p) => p.complete(prompt),
            ConfiguredProvider::Anthropic(p) => p.complete(prompt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_from_config() {
        let config = ProviderConfig {
            kind: ProviderKind::Mock,
            model: "offline".to_string(),
            endpoint: None,
            api_key_env: None,
            timeout_secs: 1,
            max_retries: 1,
        };
        let provider = ConfiguredProvider::from_config(&config).unwrap();
        assert_eq!(provider.model_name(), "offline");
        assert_eq!(provider.complete("x").unwrap().text, "{}");
    }

    #[test]
    fn test_missing_api_key_env_is_config_error() {
        let config = ProviderConfig {
            api_key_env: Some("GONGGO_TEST_SURELY_UNSET_KEY".to_string()),
            ..ProviderConfig::small_default()
        };
        let result = ConfiguredProvider::from_config(&config);
        assert!(matches!(result, Err(LlmError::Config(_))));
    }

    #[test]
    fn test_openai_without_key_name_is_config_error() {
        let config = ProviderConfig {
            api_key_env: None,
            ..ProviderConfig::small_default()
        };
        assert!(matches!(
            ConfiguredProvider::from_config(&config),
            Err(LlmError::Config(_))
        ));
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let config = ProviderConfig {
            kind: ProviderKind::Ollama,
            model: "qwen2.5:7b".to_string(),
            endpoint: None,
            api_key_env: None,
            timeout_secs: 5,
            max_retries: 1,
        };
        let provider = ConfiguredProvider::from_config(&config).unwrap();
        assert_eq!(provider.model_name(), "qwen2.5:7b");
    }

    #[test]
    fn test_kind_is_lowercase_and_defaults_apply() {
        let config: ProviderConfig =
            serde_json::from_str(r#"{"kind": "openai", "model": "m"}"#).unwrap();
        assert_eq!(config.kind, ProviderKind::OpenAi);
        assert_eq!(config.timeout_secs, 120);
        assert_eq!(config.max_retries, 3);
    }
}
