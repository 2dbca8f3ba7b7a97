//! Aggregate statistics over many extraction outcomes

use crate::types::ExtractionOutcome;
use gonggo_domain::{Field, TierLevel, TokenUsage};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Running totals for a batch of jobs
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineMetrics {
    /// Jobs recorded
    pub jobs: usize,

    /// Jobs by the highest tier they reached
    pub by_highest_tier: BTreeMap<TierLevel, usize>,

    /// Model cost across all jobs (won)
    pub total_cost_krw: f64,

    /// Focused-tier tokens across all jobs
    pub tier2_usage: TokenUsage,

    /// Escalation-tier tokens across all jobs
    pub tier3_usage: TokenUsage,

    /// How often each field stayed unresolved
    pub failed_by_field: BTreeMap<Field, usize>,

    /// Jobs that reached the escalation tier
    pub escalations: usize,

    /// Pattern suggestions received
    pub suggestions: usize,

    coverage_sum: f64,
}

impl PipelineMetrics {
    /// Create empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one job's outcome
    pub fn record(&mut self, outcome: &ExtractionOutcome) {
        self.jobs += 1;
        *self.by_highest_tier.entry(outcome.highest_tier).or_insert(0) += 1;
        self.total_cost_krw += outcome.total_cost_krw;
        self.tier2_usage += outcome.tier2_usage;
        self.tier3_usage += outcome.tier3_usage;
        for field in &outcome.failed_fields {
            *self.failed_by_field.entry(*field).or_insert(0) += 1;
        }
        if outcome.escalated() {
            self.escalations += 1;
        }
        self.suggestions += outcome.pattern_suggestions.len();
        self.coverage_sum += outcome.coverage_percent;
    }

    /// Mean coverage in percent; 0 with no jobs
    pub fn mean_coverage(&self) -> f64 {
        if self.jobs == 0 {
            return 0.0;
        }
        self.coverage_sum / self.jobs as f64
    }

    /// Mean model cost per job (won)
    pub fn mean_cost_krw(&self) -> f64 {
        if self.jobs == 0 {
            return 0.0;
        }
        self.total_cost_krw / self.jobs as f64
    }

    /// Multi-line text report
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Jobs:            {}", self.jobs);
        for tier in [TierLevel::Tier1, TierLevel::Tier2, TierLevel::Tier3] {
            let count = self.by_highest_tier.get(&tier).copied().unwrap_or(0);
            let _ = writeln!(out, "  ended at {}:   {}", tier, count);
        }
        let _ = writeln!(out, "Mean coverage:   {:.1}%", self.mean_coverage());
        let _ = writeln!(
            out,
            "Total cost:      {:.2} KRW ({:.2} KRW/job)",
            self.total_cost_krw,
            self.mean_cost_krw()
        );
        let _ = writeln!(out, "Tier 2 tokens:   {}", self.tier2_usage.total());
        let _ = writeln!(out, "Tier 3 tokens:   {}", self.tier3_usage.total());
        let _ = writeln!(out, "Escalations:     {}", self.escalations);
        let _ = writeln!(out, "Suggestions:     {}", self.suggestions);

        let mut failed: Vec<(&Field, &usize)> = self.failed_by_field.iter().collect();
        failed.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
        if !failed.is_empty() {
            let _ = writeln!(out, "Most often missing:");
            for (field, count) in failed.into_iter().take(5) {
                let _ = writeln!(out, "  {:<26} {}", field.key(), count);
            }
        }
        out
    }
}
