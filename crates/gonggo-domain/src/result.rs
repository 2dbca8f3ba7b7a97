//! Extraction results - the atomic output of every tier

use crate::confidence::Confidence;
use crate::field::{Field, FieldGroup};
use crate::tier::TierLevel;
use crate::value::FieldValue;
use serde::Serialize;

/// One field's extraction outcome from one tier
///
/// `value` is `None` only for the cheap model tier's "could not resolve"
/// answers, which always carry [`Confidence::Low`]. Results with a value
/// are what the orchestrator merges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    /// Field this result is for
    pub field: Field,

    /// Semantic group of the field
    pub group: FieldGroup,

    /// Extracted value, if any
    pub value: Option<FieldValue>,

    /// Certainty tag
    pub confidence: Confidence,

    /// Tier that produced it
    pub tier: TierLevel,

    /// Rule name or model name that produced it
    pub source: String,
}

impl ExtractionResult {
    /// Result of a rule match
    pub fn tier1(
        field: Field,
        value: FieldValue,
        confidence: Confidence,
        source: impl Into<String>,
    ) -> Self {
        Self {
            field,
            group: field.group(),
            value: Some(value),
            confidence,
            tier: TierLevel::Tier1,
            source: source.into(),
        }
    }

    /// Result of a cheap-model answer
    ///
    /// A `None` value is recorded as `Low`, a value as `Medium`.
    pub fn tier2(field: Field, value: Option<FieldValue>, source: impl Into<String>) -> Self {
        let confidence = if value.is_some() {
            Confidence::Medium
        } else {
            Confidence::Low
        };
        Self {
            field,
            group: field.group(),
            value,
            confidence,
            tier: TierLevel::Tier2,
            source: source.into(),
        }
    }

    /// Result of the escalation tier; always `High`
    pub fn tier3(field: Field, value: FieldValue, source: impl Into<String>) -> Self {
        Self {
            field,
            group: field.group(),
            value: Some(value),
            confidence: Confidence::High,
            tier: TierLevel::Tier3,
            source: source.into(),
        }
    }

    /// Whether this result carries a usable value
    pub fn is_resolved(&self) -> bool {
        self.value.is_some()
    }
}

/// A candidate improvement to the rule table, proposed by the escalation tier
///
/// Suggestions are written to a feedback store for offline curation and are
/// never applied automatically.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternSuggestion {
    /// Field the suggestion targets
    pub field: Field,

    /// Value the model extracted
    pub extracted_value: String,

    /// Text around the value in the source document
    pub context_snippet: String,

    /// Proposed regular expression
    pub suggested_pattern: String,

    /// Why the existing rules missed it
    pub failure_reason: String,
}
