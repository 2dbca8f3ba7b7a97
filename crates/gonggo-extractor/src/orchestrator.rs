//! Extraction orchestrator
//!
//! Runs the tiers in order for one job, decides on escalation, merges the
//! results and reports every paid call to the cost log.
//!
//! ```text
//! JobInput → compose_text → Tier 1 → [Tier 2 per group] → escalation? → [Tier 3] → merge
//! ```
//!
//! Merge precedence: Tier 1 results stand; Tier 2 fills only fields still
//! empty; Tier 3 overwrites anything it returns a value for.

use crate::config::ThreeTierConfig;
use crate::registry::PatternRegistry;
use crate::sink::MemorySink;
use crate::text::compose_text;
use crate::tier1::Tier1Engine;
use crate::tier2::Tier2Extractor;
use crate::tier3::Tier3Extractor;
use crate::types::{
    unix_timestamp, EscalationReason, ExtractionOutcome, GroupStatus, JobContext, JobInput,
    PipelineStage, Tier2GroupReport,
};
use gonggo_domain::traits::{CostLog, FeedbackStore, LlmProvider};
use gonggo_domain::{
    CostEntry, ExtractionResult, Field, FieldGroup, PatternSuggestion, TierLevel, TokenUsage,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{info, warn};

/// Drives the three tiers for each job
///
/// Holds no per-job state; one orchestrator can serve concurrent jobs.
pub struct Orchestrator<T2, T3, S = MemorySink> {
    config: ThreeTierConfig,
    registry: &'static PatternRegistry,
    tier2: Option<Tier2Extractor<T2>>,
    tier3: Option<Tier3Extractor<T3, S>>,
    sink: Arc<Mutex<S>>,
}

/// What the focused tier produced for one job
#[derive(Default)]
struct Tier2Pass {
    results: Vec<ExtractionResult>,
    groups: Vec<Tier2GroupReport>,
    usage: TokenUsage,
    cost_krw: f64,
    attempted: usize,
    ran: bool,
}

impl Tier2Pass {
    fn resolved(&self) -> usize {
        self.results.iter().filter(|r| r.is_resolved()).count()
    }

    fn issued_calls(&self) -> bool {
        self.groups
            .iter()
            .any(|g| matches!(g.status, GroupStatus::Completed | GroupStatus::ParseFailed | GroupStatus::CallFailed))
    }
}

impl<T2, T3, S> Orchestrator<T2, T3, S>
where
    T2: LlmProvider + Send + Sync + 'static,
    T2::Error: std::fmt::Display,
    T3: LlmProvider + Send + Sync + 'static,
    T3::Error: std::fmt::Display,
    S: FeedbackStore + CostLog,
    <S as FeedbackStore>::Error: std::fmt::Display,
    <S as CostLog>::Error: std::fmt::Display,
{
    /// Create an orchestrator with only the rule tier
    ///
    /// `sink` receives cost reports and pattern suggestions.
    pub fn new(config: ThreeTierConfig, sink: S) -> Self {
        Self {
            config,
            registry: PatternRegistry::standard(),
            tier2: None,
            tier3: None,
            sink: Arc::new(Mutex::new(sink)),
        }
    }

    /// Attach the focused-tier provider
    pub fn with_tier2(mut self, provider: T2) -> Self {
        self.tier2 = Some(Tier2Extractor::new(Arc::new(provider), &self.config));
        self
    }

    /// Attach the escalation-tier provider
    pub fn with_tier3(mut self, provider: T3) -> Self {
        let extractor = Tier3Extractor::new(Arc::new(provider), &self.config)
            .with_feedback(Arc::clone(&self.sink));
        self.tier3 = Some(extractor);
        self
    }

    /// Replace the rule table
    pub fn with_registry(mut self, registry: &'static PatternRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Pipeline configuration
    pub fn config(&self) -> &ThreeTierConfig {
        &self.config
    }

    /// Shared cost and feedback sink
    pub fn sink(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.sink)
    }

    /// Extract every field from one announcement
    ///
    /// Never fails: tier failures are logged and contribute nothing.
    pub async fn extract(&self, input: JobInput) -> ExtractionOutcome {
        let started = Instant::now();
        let text = compose_text(&input);
        let mut job = JobContext::new(input.job_id, &self.config);
        let mut stages = vec![PipelineStage::Init];

        info!(
            "Starting extraction for job '{}', {} chars",
            job.job_id,
            text.chars().count()
        );

        // Tier 1
        let tier1 = Tier1Engine::new(self.registry).run(&text);
        let mut merged: BTreeMap<Field, ExtractionResult> =
            tier1.iter().map(|r| (r.field, r.clone())).collect();
        let mut highest_tier = TierLevel::Tier1;
        stages.push(PipelineStage::Tier1Done);
        info!("Tier 1 resolved {}/{} fields", merged.len(), Field::ALL.len());

        // Tier 2
        let tier2 = self.run_tier2(&merged, &text, &mut job).await;
        if tier2.ran {
            stages.push(PipelineStage::Tier2Done);
        }
        if tier2.issued_calls() {
            highest_tier = TierLevel::Tier2;
        }
        for result in tier2.results.iter().filter(|r| r.is_resolved()) {
            merged.entry(result.field).or_insert_with(|| result.clone());
        }

        // Escalation
        let escalation_reasons = self.escalation_reasons(merged.len(), tier1.len(), &tier2, &text);
        let mut tier3_usage = TokenUsage::default();
        let mut tier3_cost_krw = 0.0;
        let mut tier3_reasoning = None;
        let mut pattern_suggestions: Vec<PatternSuggestion> = Vec::new();

        let wants_tier3 =
            (self.config.tier3_enabled && !escalation_reasons.is_empty()) || self.config.force_tier3;

        if let Some(tier3) = self.tier3.as_ref().filter(|_| wants_tier3) {
            if job.tier3_budget_exhausted() {
                warn!(
                    "Tier 3 skipped for job '{}': cost {:.2} KRW reached ceiling {:.2} KRW",
                    job.job_id,
                    job.cost_krw(),
                    self.config.tier3_max_cost_krw
                );
            } else {
                info!("Escalating job '{}' to Tier 3: {:?}", job.job_id, escalation_reasons);
                highest_tier = TierLevel::Tier3;

                match tier3.extract_all(&text, &tier1, &tier2.results, &mut job).await {
                    Ok(result) => {
                        self.report_cost(CostEntry {
                            job_id: job.job_id.clone(),
                            tier: TierLevel::Tier3,
                            model: result.model.clone(),
                            group: None,
                            usage: result.usage,
                            cost_krw: result.cost_krw,
                            created_at: unix_timestamp(),
                        });
                        for (field, value) in result.fields {
                            merged.insert(field, ExtractionResult::tier3(field, value, result.model.as_str()));
                        }
                        tier3_usage = result.usage;
                        tier3_cost_krw = result.cost_krw;
                        tier3_reasoning = Some(result.reasoning);
                        pattern_suggestions = result.pattern_suggestions;
                        stages.push(PipelineStage::Tier3Done);
                    }
                    Err(e) => warn!("Tier 3 failed for job '{}': {}", job.job_id, e),
                }
            }
        }

        // Merge
        stages.push(PipelineStage::Merged);
        let failed_fields: Vec<Field> = Field::ALL
            .iter()
            .copied()
            .filter(|f| !merged.contains_key(f))
            .collect();
        let coverage_percent = merged.len() as f64 / Field::ALL.len() as f64 * 100.0;
        let total_cost_krw = tier2.cost_krw + tier3_cost_krw;

        info!(
            "Job '{}' done: {}/{} fields ({:.1}%), highest {}, {:.2} KRW",
            job.job_id,
            merged.len(),
            Field::ALL.len(),
            coverage_percent,
            highest_tier,
            total_cost_krw
        );

        ExtractionOutcome {
            job_id: job.job_id,
            fields: merged,
            highest_tier,
            tier2_usage: tier2.usage,
            tier3_usage,
            tier2_cost_krw: tier2.cost_krw,
            tier3_cost_krw,
            total_cost_krw,
            failed_fields,
            coverage_percent,
            escalation_reasons,
            tier3_reasoning,
            pattern_suggestions,
            tier2_groups: tier2.groups,
            stages,
            processing_time_ms: started.elapsed().as_millis() as u64,
        }
    }

    async fn run_tier2(
        &self,
        merged: &BTreeMap<Field, ExtractionResult>,
        text: &str,
        job: &mut JobContext,
    ) -> Tier2Pass {
        let mut pass = Tier2Pass::default();

        let Some(tier2) = self.tier2.as_ref().filter(|_| self.config.tier2_enabled) else {
            return pass;
        };
        let missing: Vec<Field> = Field::ALL
            .iter()
            .copied()
            .filter(|f| !merged.contains_key(f))
            .collect();
        if missing.is_empty() {
            return pass;
        }
        pass.ran = true;

        for group in FieldGroup::ALL {
            let requested: Vec<Field> = missing.iter().copied().filter(|f| f.group() == group).collect();
            if requested.is_empty() {
                continue;
            }

            if job.tier2_budget_exhausted() {
                warn!(
                    "Tier 2 cost ceiling reached for job '{}' ({:.2}/{:.2} KRW); skipping group {}",
                    job.job_id,
                    job.cost_krw(),
                    self.config.tier2_max_cost_krw,
                    group
                );
                pass.groups.push(Tier2GroupReport {
                    group,
                    status: GroupStatus::SkippedBudget,
                    requested: requested.len(),
                    resolved: 0,
                    usage: TokenUsage::default(),
                    cost_krw: 0.0,
                    tokens_per_field: 0,
                });
                continue;
            }

            pass.attempted += requested.len();
            match tier2.extract_group(group, &requested, text, job).await {
                Ok(outcome) => {
                    self.report_cost(CostEntry {
                        job_id: job.job_id.clone(),
                        tier: TierLevel::Tier2,
                        model: outcome.model.clone(),
                        group: Some(group),
                        usage: outcome.usage,
                        cost_krw: outcome.cost_krw,
                        created_at: unix_timestamp(),
                    });
                    pass.usage += outcome.usage;
                    pass.cost_krw += outcome.cost_krw;
                    pass.groups.push(Tier2GroupReport {
                        group,
                        status: if outcome.parse_error.is_some() {
                            GroupStatus::ParseFailed
                        } else {
                            GroupStatus::Completed
                        },
                        requested: requested.len(),
                        resolved: outcome.resolved_count(),
                        usage: outcome.usage,
                        cost_krw: outcome.cost_krw,
                        tokens_per_field: outcome.tokens_per_field,
                    });
                    pass.results.extend(outcome.results);
                }
                Err(e) => {
                    warn!("Tier 2 group {} failed for job '{}': {}", group, job.job_id, e);
                    pass.groups.push(Tier2GroupReport {
                        group,
                        status: GroupStatus::CallFailed,
                        requested: requested.len(),
                        resolved: 0,
                        usage: TokenUsage::default(),
                        cost_krw: 0.0,
                        tokens_per_field: 0,
                    });
                }
            }
        }

        pass
    }

    fn escalation_reasons(
        &self,
        resolved: usize,
        tier1_resolved: usize,
        tier2: &Tier2Pass,
        text: &str,
    ) -> Vec<EscalationReason> {
        let policy = &self.config.escalation;
        let total = Field::ALL.len();
        let missing = total - resolved.min(total);
        let mut reasons = Vec::new();

        if missing as f64 / total as f64 > policy.missing_ratio_threshold {
            reasons.push(EscalationReason::MissingRatio { missing, total });
        }

        let tier2_resolved = tier2.resolved();
        if tier1_resolved < policy.min_tier1_fields
            && tier2.attempted > 0
            && (tier2_resolved as f64) < policy.tier2_success_ratio * tier2.attempted as f64
        {
            reasons.push(EscalationReason::UnfamiliarLayout {
                tier1_resolved,
                tier2_resolved,
                tier2_attempted: tier2.attempted,
            });
        }

        let chars = text.trim().chars().count();
        if chars < policy.min_text_chars {
            reasons.push(EscalationReason::ShortText { chars });
        }

        if self.config.force_tier3 {
            reasons.push(EscalationReason::Forced);
        }

        reasons
    }

    fn report_cost(&self, entry: CostEntry) {
        match self.sink.lock() {
            Ok(mut sink) => {
                if let Err(e) = sink.record_cost(&entry) {
                    warn!("Failed to record {} cost for job '{}': {}", entry.tier, entry.job_id, e);
                }
            }
            Err(_) => warn!(
                "Cost log lock poisoned; dropping {} cost for job '{}'",
                entry.tier, entry.job_id
            ),
        }
    }
}
