//! Request, job-state and outcome types for extraction

use crate::config::ThreeTierConfig;
use gonggo_domain::{ExtractionResult, Field, FieldGroup, FieldValue, PatternSuggestion, TierLevel, TokenUsage};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Request to extract fields from one announcement
#[derive(Debug, Clone, Default)]
pub struct JobInput {
    /// Opaque job identifier, used for cost and feedback records
    pub job_id: String,

    /// Text of the attached announcement document
    pub document_text: Option<String>,

    /// Raw HTML of the announcement's detail page
    pub detail_html: Option<String>,

    /// Short description from the listing
    pub description: Option<String>,
}

impl JobInput {
    /// Create a job from the primary document text
    pub fn new(job_id: impl Into<String>, document_text: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            document_text: Some(document_text.into()),
            detail_html: None,
            description: None,
        }
    }

    /// Add the detail-page HTML
    pub fn with_detail_html(mut self, html: impl Into<String>) -> Self {
        self.detail_html = Some(html.into());
        self
    }

    /// Add the listing description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Per-job state carried through the tiers
///
/// Created at the start of [`Orchestrator::extract`](crate::Orchestrator::extract)
/// and dropped when it returns. The running cost is only mutated by the
/// single sequential call path of its job.
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Job identifier
    pub job_id: String,

    cost_krw: f64,
    tier2_max_cost_krw: f64,
    tier3_max_cost_krw: f64,
}

impl JobContext {
    /// Create a context with the ceilings of `config`
    pub fn new(job_id: impl Into<String>, config: &ThreeTierConfig) -> Self {
        Self {
            job_id: job_id.into(),
            cost_krw: 0.0,
            tier2_max_cost_krw: config.tier2_max_cost_krw,
            tier3_max_cost_krw: config.tier3_max_cost_krw,
        }
    }

    /// Cost spent on this job so far (won)
    pub fn cost_krw(&self) -> f64 {
        self.cost_krw
    }

    /// Add the cost of one model call
    pub fn add_cost(&mut self, cost_krw: f64) {
        if cost_krw.is_finite() && cost_krw > 0.0 {
            self.cost_krw += cost_krw;
        }
    }

    /// Whether the focused tier may not make another call
    pub fn tier2_budget_exhausted(&self) -> bool {
        self.cost_krw >= self.tier2_max_cost_krw
    }

    /// Whether the escalation tier may not run
    pub fn tier3_budget_exhausted(&self) -> bool {
        self.cost_krw >= self.tier3_max_cost_krw
    }
}

/// Current time in Unix seconds; 0 if the clock is before the epoch
pub(crate) fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Result of one focused-tier group call
#[derive(Debug, Clone)]
pub struct Tier2GroupOutcome {
    /// Group the call covered
    pub group: FieldGroup,

    /// Fields requested in the prompt
    pub requested: Vec<Field>,

    /// One result per requested field; unresolved ones are `Low` with no value
    pub results: Vec<ExtractionResult>,

    /// Tokens reported by the provider
    pub usage: TokenUsage,

    /// Estimated cost (won)
    pub cost_krw: f64,

    /// Even split of the call's tokens over the requested fields
    pub tokens_per_field: u64,

    /// Why the response could not be parsed, if it could not
    pub parse_error: Option<String>,

    /// Model that served the call
    pub model: String,
}

impl Tier2GroupOutcome {
    /// Number of requested fields that received a value
    pub fn resolved_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_resolved()).count()
    }
}

/// Result of the full-document escalation call
#[derive(Debug, Clone)]
pub struct Tier3Result {
    /// Values the model returned, already type-checked
    pub fields: BTreeMap<Field, FieldValue>,

    /// Tokens reported by the provider
    pub usage: TokenUsage,

    /// Estimated cost (won)
    pub cost_krw: f64,

    /// Model's rationale, or why its answer could not be read
    pub reasoning: String,

    /// Proposed rule improvements
    pub pattern_suggestions: Vec<PatternSuggestion>,

    /// Model that served the call
    pub model: String,
}

/// Stages a job passes through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Context created
    Init,
    /// Rule pass complete
    Tier1Done,
    /// Focused model pass complete
    Tier2Done,
    /// Escalation pass complete
    Tier3Done,
    /// Results merged
    Merged,
}

/// Why a job escalated to the full-document tier
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum EscalationReason {
    /// Too many fields remain unresolved
    MissingRatio {
        /// Unresolved fields
        missing: usize,
        /// Declared fields
        total: usize,
    },
    /// Rules and the focused tier both did poorly
    UnfamiliarLayout {
        /// Fields the rules resolved
        tier1_resolved: usize,
        /// Fields the focused tier resolved
        tier2_resolved: usize,
        /// Fields the focused tier was asked for
        tier2_attempted: usize,
    },
    /// Almost no text to work with
    ShortText {
        /// Trimmed character count
        chars: usize,
    },
    /// Escalation forced by configuration
    Forced,
}

/// How a focused-tier group ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    /// Response parsed
    Completed,
    /// Response received but unreadable
    ParseFailed,
    /// Provider call failed or timed out
    CallFailed,
    /// Not called because the job hit the cost ceiling
    SkippedBudget,
}

/// Per-group summary of the focused tier
#[derive(Debug, Clone, Serialize)]
pub struct Tier2GroupReport {
    /// Group
    pub group: FieldGroup,
    /// Outcome
    pub status: GroupStatus,
    /// Fields that were missing in this group
    pub requested: usize,
    /// Fields resolved by the call
    pub resolved: usize,
    /// Tokens used
    pub usage: TokenUsage,
    /// Estimated cost (won)
    pub cost_krw: f64,
    /// Attributed tokens per requested field
    pub tokens_per_field: u64,
}

/// Unified result of one job
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutcome {
    /// Job identifier
    pub job_id: String,

    /// At most one value-bearing result per field
    pub fields: BTreeMap<Field, ExtractionResult>,

    /// Highest tier that was invoked
    pub highest_tier: TierLevel,

    /// Focused-tier tokens
    pub tier2_usage: TokenUsage,

    /// Escalation-tier tokens
    pub tier3_usage: TokenUsage,

    /// Focused-tier cost (won)
    pub tier2_cost_krw: f64,

    /// Escalation-tier cost (won)
    pub tier3_cost_krw: f64,

    /// Sum of model costs; rules are free
    pub total_cost_krw: f64,

    /// Fields no tier resolved, in declaration order
    pub failed_fields: Vec<Field>,

    /// Resolved share of all declared fields, 0 to 100
    pub coverage_percent: f64,

    /// Conditions that held when escalation was evaluated
    pub escalation_reasons: Vec<EscalationReason>,

    /// Rationale returned by the escalation tier
    pub tier3_reasoning: Option<String>,

    /// Rule improvements proposed by the escalation tier
    pub pattern_suggestions: Vec<PatternSuggestion>,

    /// Focused-tier group summaries, in processing order
    pub tier2_groups: Vec<Tier2GroupReport>,

    /// Stages the job passed through
    pub stages: Vec<PipelineStage>,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl ExtractionOutcome {
    /// Value of a field, if resolved
    pub fn value(&self, field: Field) -> Option<&FieldValue> {
        self.fields.get(&field).and_then(|r| r.value.as_ref())
    }

    /// Whether the escalation tier contributed to this outcome
    pub fn escalated(&self) -> bool {
        self.stages.contains(&PipelineStage::Tier3Done)
    }
}
