//! Bridging blocking providers into the async pipeline

use crate::error::ExtractorError;
use gonggo_domain::traits::{Completion, LlmProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Run one provider call on the blocking pool, bounded by `limit`
///
/// A timed-out call is abandoned; its blocking task finishes in the
/// background and its result is dropped.
pub(crate) async fn call_provider<L>(
    provider: &Arc<L>,
    prompt: String,
    limit: Duration,
) -> Result<Completion, ExtractorError>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: std::fmt::Display,
{
    let llm = Arc::clone(provider);

    let task = tokio::task::spawn_blocking(move || {
        llm.complete(&prompt)
            .map_err(|e| ExtractorError::Llm(e.to_string()))
    });

    timeout(limit, task)
        .await
        .map_err(|_| ExtractorError::Timeout(limit.as_secs()))?
        .map_err(|e| ExtractorError::Join(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use gonggo_llm::MockProvider;

    struct SlowProvider;

    impl LlmProvider for SlowProvider {
        type Error = String;

        fn model_name(&self) -> &str {
            "slow"
        }

        fn complete(&self, _prompt: &str) -> Result<Completion, Self::Error> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(Completion::new("{}", Default::default()))
        }
    }

    #[tokio::test]
    async fn test_call_returns_completion() {
        let provider = Arc::new(MockProvider::new("{\"a\": 1}"));
        let completion = call_provider(&provider, "prompt".to_string(), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(completion.text, "{\"a\": 1}");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_provider_error_is_mapped() {
        let mut mock = MockProvider::default();
        mock.add_error("prompt");
        let provider = Arc::new(mock);

        let result = call_provider(&provider, "prompt".to_string(), Duration::from_secs(5)).await;
        assert!(matches!(result, Err(ExtractorError::Llm(_))));
    }

    #[tokio::test]
    async fn test_slow_call_times_out() {
        let provider = Arc::new(SlowProvider);
        let result = call_provider(&provider, "prompt".to_string(), Duration::from_millis(50)).await;
        assert!(matches!(result, Err(ExtractorError::Timeout(_))));
    }
}
