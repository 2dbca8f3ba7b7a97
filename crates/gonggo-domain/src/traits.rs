//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the extraction core and its
//! collaborators. Implementations live in other crates.

use crate::record::{CostEntry, FeedbackRecord, TokenUsage};

/// Text returned by a model together with its token usage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Generated text
    pub text: String,

    /// Tokens consumed by the call
    pub usage: TokenUsage,
}

impl Completion {
    /// Create a completion
    pub fn new(text: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            text: text.into(),
            usage,
        }
    }
}

/// Trait for language model provider operations
///
/// Implemented by the infrastructure layer (gonggo-llm). Calls are
/// blocking; the pipeline runs them on the blocking thread pool.
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Name of the model serving requests, used as result source
    fn model_name(&self) -> &str;

    /// Generate a completion for a prompt
    fn complete(&self, prompt: &str) -> Result<Completion, Self::Error>;
}

/// Append-only sink for pattern suggestions
///
/// Implemented by the infrastructure layer (gonggo-store). Callers treat
/// failures as non-fatal.
pub trait FeedbackStore {
    /// Error type for store operations
    type Error;

    /// Append one suggestion record
    fn append_feedback(&mut self, record: &FeedbackRecord) -> Result<(), Self::Error>;
}

/// Sink for per-call token and cost reports
///
/// Implemented by the infrastructure layer (gonggo-store). Callers treat
/// failures as non-fatal.
pub trait CostLog {
    /// Error type for log operations
    type Error;

    /// Record one model call
    fn record_cost(&mut self, entry: &CostEntry) -> Result<(), Self::Error>;
}
