//! Tier 2: focused extraction with a small model
//!
//! One call per field group, asking only for the fields the rules missed in
//! that group. Unresolved answers come back as `Low` results without a value
//! so callers can count what was attempted.

use crate::call::call_provider;
use crate::config::ThreeTierConfig;
use crate::cost::{estimate_cost, tokens_per_field, ModelRates};
use crate::error::ExtractorError;
use crate::parser::{parse_tier2_response, ParseOutcome};
use crate::prompt::GroupPromptBuilder;
use crate::text::truncate_chars;
use crate::types::{JobContext, Tier2GroupOutcome};
use gonggo_domain::traits::LlmProvider;
use gonggo_domain::{ExtractionResult, Field, FieldGroup, TokenUsage};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Focused per-group extractor
pub struct Tier2Extractor<L> {
    provider: Arc<L>,
    rates: ModelRates,
    max_chars: usize,
    call_timeout: Duration,
}

impl<L> Tier2Extractor<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: std::fmt::Display,
{
    /// Create an extractor using the focused-tier settings of `config`
    pub fn new(provider: Arc<L>, config: &ThreeTierConfig) -> Self {
        Self {
            provider,
            rates: config.tier2_rates,
            max_chars: config.tier2_max_chars,
            call_timeout: config.call_timeout(),
        }
    }

    /// Model serving this tier
    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Extract the `missing` fields belonging to `group`
    ///
    /// Fields of other groups in `missing` are ignored. The call's cost is
    /// added to `job` whether or not the response parses. The cost ceiling
    /// is the caller's concern.
    ///
    /// # Errors
    ///
    /// Provider failures, timeouts and join errors. An unreadable response
    /// is not an error; it yields unresolved results and `parse_error`.
    pub async fn extract_group(
        &self,
        group: FieldGroup,
        missing: &[Field],
        text: &str,
        job: &mut JobContext,
    ) -> Result<Tier2GroupOutcome, ExtractorError> {
        let requested: Vec<Field> = missing.iter().copied().filter(|f| f.group() == group).collect();
        let model = self.model_name().to_string();

        if requested.is_empty() {
            return Ok(Tier2GroupOutcome {
                group,
                requested,
                results: Vec::new(),
                usage: TokenUsage::default(),
                cost_krw: 0.0,
                tokens_per_field: 0,
                parse_error: None,
                model,
            });
        }

        let excerpt = truncate_chars(text, self.max_chars);
        let prompt = GroupPromptBuilder::new(group, &requested, excerpt).build();
        debug!(
            "Tier 2 group {} prompt: {} chars for {} fields",
            group,
            prompt.chars().count(),
            requested.len()
        );

        let completion = call_provider(&self.provider, prompt, self.call_timeout).await?;
        debug!("Tier 2 group {} response: {} chars", group, completion.text.chars().count());

        let usage = completion.usage;
        let cost_krw = estimate_cost(&usage, &self.rates);
        job.add_cost(cost_krw);

        let (results, parse_error) = match parse_tier2_response(&completion.text, &requested) {
            ParseOutcome::Parsed(values) => {
                let results = values
                    .into_iter()
                    .map(|(field, value)| ExtractionResult::tier2(field, value, model.as_str()))
                    .collect();
                (results, None)
            }
            ParseOutcome::Failed(reason) => {
                warn!("Tier 2 group {} response could not be parsed: {}", group, reason);
                let results = requested
                    .iter()
                    .map(|field| ExtractionResult::tier2(*field, None, model.as_str()))
                    .collect();
                (results, Some(reason))
            }
        };

        let outcome = Tier2GroupOutcome {
            group,
            tokens_per_field: tokens_per_field(&usage, requested.len()),
            requested,
            results,
            usage,
            cost_krw,
            parse_error,
            model,
        };

        info!(
            "Tier 2 group {}: {}/{} fields, {} tokens, {:.4} KRW",
            group,
            outcome.resolved_count(),
            outcome.requested.len(),
            usage.total(),
            cost_krw
        );

        Ok(outcome)
    }
}
