//! Tier 3: full-document escalation with a large model
//!
//! Sees everything the earlier tiers produced and may overrule it. Besides
//! values it proposes new rules, which are written to a feedback store for
//! offline curation.

use crate::call::call_provider;
use crate::config::ThreeTierConfig;
use crate::cost::{estimate_cost, ModelRates};
use crate::error::ExtractorError;
use crate::parser::{parse_tier3_response, ParseOutcome, Tier3Response};
use crate::prompt::FullDocumentPromptBuilder;
use crate::sink::MemorySink;
use crate::text::truncate_chars;
use crate::types::{unix_timestamp, JobContext, Tier3Result};
use gonggo_domain::traits::{FeedbackStore, LlmProvider};
use gonggo_domain::{ExtractionResult, FeedbackRecord, Field, PatternSuggestion};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Full-document extractor
pub struct Tier3Extractor<L, F = MemorySink> {
    provider: Arc<L>,
    feedback: Option<Arc<Mutex<F>>>,
    rates: ModelRates,
    max_chars: usize,
    call_timeout: Duration,
}

impl<L, F> Tier3Extractor<L, F>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: std::fmt::Display,
    F: FeedbackStore,
    F::Error: std::fmt::Display,
{
    /// Create an extractor using the escalation settings of `config`
    pub fn new(provider: Arc<L>, config: &ThreeTierConfig) -> Self {
        Self {
            provider,
            feedback: None,
            rates: config.tier3_rates,
            max_chars: config.tier3_max_chars,
            call_timeout: config.call_timeout(),
        }
    }

    /// Persist pattern suggestions to `store`
    pub fn with_feedback(mut self, store: Arc<Mutex<F>>) -> Self {
        self.feedback = Some(store);
        self
    }

    /// Model serving this tier
    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Review the whole document
    ///
    /// An unreadable response yields an empty field map and a `reasoning`
    /// that says why; its cost is still counted.
    ///
    /// # Errors
    ///
    /// Provider failures, timeouts and join errors.
    pub async fn extract_all(
        &self,
        text: &str,
        tier1: &[ExtractionResult],
        tier2: &[ExtractionResult],
        job: &mut JobContext,
    ) -> Result<Tier3Result, ExtractorError> {
        let excerpt = truncate_chars(text, self.max_chars);
        let prompt = FullDocumentPromptBuilder::new(excerpt)
            .with_prior_results(tier1.iter().chain(tier2.iter()))
            .build();
        debug!("Tier 3 prompt: {} chars", prompt.chars().count());

        let completion = call_provider(&self.provider, prompt, self.call_timeout).await?;
        debug!("Tier 3 response: {} chars", completion.text.chars().count());

        let usage = completion.usage;
        let cost_krw = estimate_cost(&usage, &self.rates);
        job.add_cost(cost_krw);

        let response = match parse_tier3_response(&completion.text) {
            ParseOutcome::Parsed(response) => response,
            ParseOutcome::Failed(reason) => {
                warn!("Tier 3 response could not be parsed: {}", reason);
                Tier3Response {
                    reasoning: format!("Response could not be parsed: {}", reason),
                    ..Tier3Response::default()
                }
            }
        };

        self.persist_suggestions(&job.job_id, &response.suggestions, tier1, tier2);

        info!(
            "Tier 3: {} fields, {} suggestions, {} tokens, {:.2} KRW",
            response.fields.len(),
            response.suggestions.len(),
            usage.total(),
            cost_krw
        );

        Ok(Tier3Result {
            fields: response.fields,
            usage,
            cost_krw,
            reasoning: response.reasoning,
            pattern_suggestions: response.suggestions,
            model: self.model_name().to_string(),
        })
    }

    /// Append one record per suggestion; failures are logged and dropped
    fn persist_suggestions(
        &self,
        job_id: &str,
        suggestions: &[PatternSuggestion],
        tier1: &[ExtractionResult],
        tier2: &[ExtractionResult],
    ) {
        let Some(store) = self.feedback.as_ref() else {
            return;
        };
        if suggestions.is_empty() {
            return;
        }

        let mut store = match store.lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!(
                    "Feedback store lock poisoned; dropping {} pattern suggestions",
                    suggestions.len()
                );
                return;
            }
        };

        let created_at = unix_timestamp();
        for suggestion in suggestions {
            let record = FeedbackRecord {
                job_id: job_id.to_string(),
                suggestion: suggestion.clone(),
                tier1_value: value_for(tier1, suggestion.field),
                tier2_value: value_for(tier2, suggestion.field),
                created_at,
            };
            if let Err(e) = store.append_feedback(&record) {
                warn!("Failed to store pattern suggestion for {}: {}", suggestion.field, e);
            }
        }
    }
}

fn value_for(results: &[ExtractionResult], field: Field) -> Option<String> {
    results
        .iter()
        .find(|r| r.field == field)
        .and_then(|r| r.value.as_ref())
        .map(|v| v.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gonggo_domain::{Confidence, FieldValue};
    use gonggo_llm::MockProvider;

    const RESPONSE: &str = r#"{
        "fields": {"deadline": "2025-04-30", "budget_amount": 3000000000},
        "reasoning": "마감일은 일정표에 있음",
        "pattern_suggestions": [{
            "field": "deadline",
            "extracted_value": "2025-04-30",
            "context_snippet": "서류 마감 4.30.(수)",
            "suggested_pattern": "서류\\s*마감\\s*(\\d{1,2})\\.(\\d{1,2})",
            "failure_reason": "연도 없는 날짜"
        }]
    }"#;

    fn tier3(provider: MockProvider) -> Tier3Extractor<MockProvider> {
        Tier3Extractor::new(Arc::new(provider), &ThreeTierConfig::default())
    }

    #[tokio::test]
    async fn test_values_and_suggestions() {
        let store = Arc::new(Mutex::new(MemorySink::new()));
        let extractor = tier3(MockProvider::new(RESPONSE).with_model_name("large-model").with_usage(2_000, 200))
            .with_feedback(Arc::clone(&store));
        let mut job = JobContext::new("job-7", &ThreeTierConfig::default());

        let tier2 = vec![ExtractionResult::tier2(
            Field::Deadline,
            Some(FieldValue::Text("4월 말".to_string())),
            "small",
        )];
        let result = extractor.extract_all("본문", &[], &tier2, &mut job).await.unwrap();

        assert_eq!(result.fields.len(), 2);
        assert_eq!(result.fields[&Field::BudgetAmount], FieldValue::Amount(3_000_000_000));
        assert_eq!(result.model, "large-model");
        assert!((result.cost_krw - (2_000.0 * 0.021 + 200.0 * 0.105)).abs() < 1e-9);
        assert!((job.cost_krw() - result.cost_krw).abs() < 1e-12);

        let sink = store.lock().unwrap();
        assert_eq!(sink.feedback.len(), 1);
        let record = &sink.feedback[0];
        assert_eq!(record.job_id, "job-7");
        assert_eq!(record.field(), Field::Deadline);
        assert_eq!(record.tier1_value, None);
        assert_eq!(record.tier2_value.as_deref(), Some("4월 말"));
    }

    #[tokio::test]
    async fn test_prompt_includes_prior_results() {
        let provider = MockProvider::new("{}");
        let extractor = tier3(provider.clone());
        let mut job = JobContext::new("job", &ThreeTierConfig::default());

        let tier1 = vec![ExtractionResult::tier1(
            Field::Region,
            FieldValue::Text("부산".to_string()),
            Confidence::High,
            "region.labeled",
        )];
        extractor.extract_all("본문", &tier1, &[], &mut job).await.unwrap();

        assert!(provider.prompts()[0].contains("- region: 부산"));
    }

    #[tokio::test]
    async fn test_parse_failure_is_empty_result() {
        let store = Arc::new(Mutex::new(MemorySink::new()));
        let extractor = tier3(MockProvider::new("not json").with_usage(100, 10)).with_feedback(Arc::clone(&store));
        let mut job = JobContext::new("job", &ThreeTierConfig::default());

        let result = extractor.extract_all("본문", &[], &[], &mut job).await.unwrap();
        assert!(result.fields.is_empty());
        assert!(result.pattern_suggestions.is_empty());
        assert!(result.reasoning.contains("could not be parsed"));
        assert!(result.cost_krw > 0.0);
        assert!(store.lock().unwrap().feedback.is_empty());
    }

    #[tokio::test]
    async fn test_poisoned_feedback_store_is_survivable() {
        let store = Arc::new(Mutex::new(MemorySink::new()));
        let poison = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poison.lock().unwrap();
            panic!("poison the feedback store");
        })
        .join();
        assert!(store.is_poisoned());

        let extractor = tier3(MockProvider::new(RESPONSE)).with_feedback(store);
        let mut job = JobContext::new("job", &ThreeTierConfig::default());

        let result = extractor.extract_all("본문", &[], &[], &mut job).await.unwrap();
        assert_eq!(result.pattern_suggestions.len(), 1);
    }
}
