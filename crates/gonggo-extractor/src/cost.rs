//! Token-based cost estimation in won

use gonggo_domain::TokenUsage;
use serde::{Deserialize, Serialize};

/// Per-token prices of one model, in won
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelRates {
    /// Won per prompt token
    pub input_krw_per_token: f64,

    /// Won per completion token
    pub output_krw_per_token: f64,
}

impl ModelRates {
    /// Create a rate pair
    pub const fn new(input_krw_per_token: f64, output_krw_per_token: f64) -> Self {
        Self {
            input_krw_per_token,
            output_krw_per_token,
        }
    }

    /// Rates for the small model behind the focused tier
    pub const fn small_model() -> Self {
        Self::new(0.00021, 0.00084)
    }

    /// Rates for the large model behind the escalation tier
    pub const fn large_model() -> Self {
        Self::new(0.021, 0.105)
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.input_krw_per_token.is_finite()
            && self.output_krw_per_token.is_finite()
            && self.input_krw_per_token >= 0.0
            && self.output_krw_per_token >= 0.0
    }
}

/// Estimated cost of `usage` at `rates`
pub fn estimate_cost(usage: &TokenUsage, rates: &ModelRates) -> f64 {
    usage.input_tokens as f64 * rates.input_krw_per_token
        + usage.output_tokens as f64 * rates.output_krw_per_token
}

/// Tokens attributed to each field of a batched call
///
/// An even split of the call's total; the remainder is dropped.
pub fn tokens_per_field(usage: &TokenUsage, fields: usize) -> u64 {
    if fields == 0 {
        return 0;
    }
    usage.total() / fields as u64
}
