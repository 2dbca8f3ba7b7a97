//! In-memory feedback and cost sink

use gonggo_domain::traits::{CostLog, FeedbackStore};
use gonggo_domain::{CostEntry, FeedbackRecord};
use std::convert::Infallible;

/// Keeps every feedback record and cost entry in memory
///
/// Used when no database is configured and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    /// Pattern suggestions, in arrival order
    pub feedback: Vec<FeedbackRecord>,
    /// Model calls, in arrival order
    pub costs: Vec<CostEntry>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of recorded costs (won)
    pub fn total_cost_krw(&self) -> f64 {
        self.costs.iter().map(|c| c.cost_krw).sum()
    }
}

impl FeedbackStore for MemorySink {
    type Error = Infallible;

    fn append_feedback(&mut self, record: &FeedbackRecord) -> Result<(), Self::Error> {
        self.feedback.push(record.clone());
        Ok(())
    }
}

impl CostLog for MemorySink {
    type Error = Infallible;

    fn record_cost(&mut self, entry: &CostEntry) -> Result<(), Self::Error> {
        self.costs.push(entry.clone());
        Ok(())
    }
}
