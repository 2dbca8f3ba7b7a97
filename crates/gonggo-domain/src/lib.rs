//! Gonggo Domain Layer
//!
//! This crate contains the core vocabulary of the extraction pipeline for
//! Korean government funding announcements (공고). It defines the fixed
//! field schema, typed values, confidence tags, tiers, extraction results
//! and the trait interfaces every other layer depends upon.
//!
//! ## Key Concepts
//!
//! - **Field**: one named unit of structured data (deadline, budget, ...)
//! - **FieldGroup**: one of four semantic groups used to batch model calls
//! - **FieldValue**: a typed value with strict conversion rules
//! - **Confidence**: HIGH / MEDIUM / LOW certainty tag, not a probability
//! - **TierLevel**: rule engine, cheap model, expensive model
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture:
//! - No I/O
//! - Pure data and conversion logic only
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod confidence;
pub mod field;
pub mod record;
pub mod result;
pub mod tier;
pub mod traits;
pub mod value;

// Re-exports for convenience
pub use confidence::Confidence;
pub use field::{Field, FieldGroup, ValueKind};
pub use record::{CostEntry, FeedbackRecord, TokenUsage};
pub use result::{ExtractionResult, PatternSuggestion};
pub use tier::TierLevel;
pub use traits::Completion;
pub use value::FieldValue;
