//! Records handed to external collaborators (feedback store, cost log)

use crate::field::{Field, FieldGroup};
use crate::result::PatternSuggestion;
use crate::tier::TierLevel;
use serde::Serialize;
use std::ops::AddAssign;

/// Token counts reported by a model call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenUsage {
    /// Prompt tokens
    pub input_tokens: u64,
    /// Completion tokens
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Create a usage record
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Input plus output tokens
    pub fn total(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, other: Self) {
        self.input_tokens = self.input_tokens.saturating_add(other.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
    }
}

/// One pattern suggestion as persisted, keyed by job and field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackRecord {
    /// Job that produced the suggestion
    pub job_id: String,

    /// The suggestion itself
    pub suggestion: PatternSuggestion,

    /// Value the rule tier produced for the field, if any
    pub tier1_value: Option<String>,

    /// Value the cheap model tier produced for the field, if any
    pub tier2_value: Option<String>,

    /// Unix seconds
    pub created_at: u64,
}

impl FeedbackRecord {
    /// Field the record is keyed by
    pub fn field(&self) -> Field {
        self.suggestion.field
    }
}

/// Token and cost report for one model call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEntry {
    /// Job the call belonged to
    pub job_id: String,

    /// Tier that made the call
    pub tier: TierLevel,

    /// Model that served it
    pub model: String,

    /// Field group for per-group calls
    pub group: Option<FieldGroup>,

    /// Tokens consumed
    pub usage: TokenUsage,

    /// Estimated cost in won
    pub cost_krw: f64,

    /// Unix seconds
    pub created_at: u64,
}
