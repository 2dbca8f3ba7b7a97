//! Gonggo Extractor
//!
//! Cascading three-tier field extraction for Korean government funding
//! announcements.
//!
//! # Overview
//!
//! Most announcements follow a handful of layouts, so cheap rules resolve
//! most fields. Models are only paid for what the rules miss:
//!
//! - **Tier 1**: ordered regex rules per field, free and deterministic
//! - **Tier 2**: a small model, one call per field group, only for missing
//!   fields, bounded by a per-job cost ceiling
//! - **Tier 3**: a large model over the whole document when the earlier
//!   tiers did poorly; it overrules earlier values and proposes new rules
//!
//! # Architecture
//!
//! ```text
//! JobInput → Orchestrator → Tier 1 → Tier 2 (A, B, C, D) → Tier 3 → ExtractionOutcome
//!                                        ↓                    ↓
//!                                     CostLog        CostLog + FeedbackStore
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use gonggo_extractor::{JobInput, MemorySink, Orchestrator, ThreeTierConfig};
//! use gonggo_llm::MockProvider;
//!
//! # async fn example() {
//! let orchestrator = Orchestrator::new(ThreeTierConfig::default(), MemorySink::new())
//!     .with_tier2(MockProvider::default())
//!     .with_tier3(MockProvider::default());
//!
//! let input = JobInput::new("job-001", "접수마감일: 2025-03-15\n총 사업비: 52억원");
//! let outcome = orchestrator.extract(input).await;
//!
//! println!("Coverage: {:.1}%", outcome.coverage_percent);
//! println!("Cost: {:.2} KRW", outcome.total_cost_krw);
//! # }
//! ```

#![warn(missing_docs)]

mod call;
mod config;
mod cost;
mod error;
mod metrics;
mod orchestrator;
mod parser;
mod prompt;
mod registry;
mod rules;
mod sink;
mod text;
mod tier1;
mod tier2;
mod tier3;
mod types;

#[cfg(test)]
mod tests;

pub use config::{
    EscalationPolicy, ThreeTierConfig, ENV_FORCE_TIER3, ENV_TIER2_ENABLED, ENV_TIER2_MAX_COST,
    ENV_TIER3_ENABLED, ENV_TIER3_MAX_COST,
};
pub use cost::{estimate_cost, tokens_per_field, ModelRates};
pub use error::ExtractorError;
pub use metrics::PipelineMetrics;
pub use orchestrator::Orchestrator;
pub use parser::{
    extract_json_object, parse_tier2_response, parse_tier3_response, ParseOutcome, Tier3Response,
};
pub use prompt::{FullDocumentPromptBuilder, GroupPromptBuilder};
pub use registry::{PatternRegistry, PatternRule, PostProcessor, RuleChain, RuleMatch};
pub use sink::MemorySink;
pub use text::{compose_text, strip_html, truncate_chars};
pub use tier1::{run_tier1, Tier1Engine};
pub use tier2::Tier2Extractor;
pub use tier3::Tier3Extractor;
pub use types::{
    EscalationReason, ExtractionOutcome, GroupStatus, JobContext, JobInput, PipelineStage,
    Tier2GroupOutcome, Tier2GroupReport, Tier3Result,
};
