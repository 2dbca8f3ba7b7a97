//! Tier 1: deterministic pattern matching
//!
//! Free and pure. Every field with a rule chain is tried in declaration
//! order; fields no rule resolves are simply absent from the output.

use crate::registry::PatternRegistry;
use gonggo_domain::{ExtractionResult, Field};
use tracing::debug;

/// Runs a registry's rule chains over a text
#[derive(Debug, Clone, Copy)]
pub struct Tier1Engine<'a> {
    registry: &'a PatternRegistry,
}

impl<'a> Tier1Engine<'a> {
    /// Engine over a custom registry
    pub fn new(registry: &'a PatternRegistry) -> Self {
        Self { registry }
    }

    /// Run the engine and collect one result per resolved field
    pub fn run(&self, text: &str) -> Vec<ExtractionResult> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let results: Vec<ExtractionResult> = Field::ALL
            .iter()
            .filter_map(|field| {
                let hit = self.registry.chain(*field)?.first_match(text)?;
                Some(ExtractionResult::tier1(*field, hit.value, hit.confidence, hit.rule))
            })
            .collect();

        debug!("Tier 1 resolved {}/{} fields", results.len(), Field::ALL.len());
        results
    }
}

impl Tier1Engine<'static> {
    /// Engine over the built-in rule table
    pub fn standard() -> Self {
        Self::new(PatternRegistry::standard())
    }
}

/// Apply the built-in rule table to `text`
///
/// # Examples
///
/// ```
/// use gonggo_extractor::run_tier1;
/// use gonggo_domain::{Confidence, Field};
///
/// let results = run_tier1("접수마감일: 2025-03-15");
/// let deadline = results.iter().find(|r| r.field == Field::Deadline).unwrap();
/// assert_eq!(deadline.confidence, Confidence::High);
/// assert_eq!(deadline.source, "deadline.labeled");
/// ```
pub fn run_tier1(text: &str) -> Vec<ExtractionResult> {
    Tier1Engine::standard().run(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::PatternRule;
    use gonggo_domain::{Confidence, FieldValue, TierLevel};
    use proptest::prelude::*;

    const SAMPLE: &str = "\
2025년도 창업성장기술개발사업 시행계획 공고
주관기관: 중소벤처기업부
전담기관: 중소기업기술정보진흥원
접수기간: 2025.03.01(토) ~ 2025.03.31(월) 18:00
총 사업비: 52억원
기업당 최대 2억원
협약기간: 최대 24개월
정부지원금은 총 사업비의 75% 이내
신청자격: 창업 7년 이내 중소기업
문의처: 1357-0000";

    #[test]
    fn test_labeled_deadline() {
        let results = run_tier1("접수마감일: 2025-03-15");
        assert_eq!(results.len(), 1);

        let deadline = &results[0];
        assert_eq!(deadline.field, Field::Deadline);
        assert_eq!(deadline.tier, TierLevel::Tier1);
        assert_eq!(deadline.confidence, Confidence::High);
        assert!(matches!(deadline.value, Some(FieldValue::Date(_))));
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert!(run_tier1("").is_empty());
        assert!(run_tier1("   \n\t").is_empty());
    }

    #[test]
    fn test_sample_announcement() {
        let results = run_tier1(SAMPLE);
        let fields: Vec<Field> = results.iter().map(|r| r.field).collect();

        for expected in [
            Field::ApplicationStart,
            Field::Deadline,
            Field::Organization,
            Field::Contact,
            Field::BudgetAmount,
            Field::MaxSupportAmount,
            Field::ProjectDurationMonths,
            Field::GovernmentSharePercent,
            Field::TargetType,
            Field::BusinessAgeMaxYears,
        ] {
            assert!(fields.contains(&expected), "expected {} to resolve", expected);
        }
        assert!(!fields.contains(&Field::Keywords));

        // Results follow declaration order
        let mut sorted = fields.clone();
        sorted.sort();
        assert_eq!(fields, sorted);
    }

    #[test]
    fn test_custom_registry() {
        let mut registry = PatternRegistry::new();
        registry.register(
            PatternRule::new(
                "keywords.hashtag",
                Field::Keywords,
                Confidence::Medium,
                &[r"#(?P<v>\S+)"],
                |caps| caps.name("v").map(|m| FieldValue::List(vec![m.as_str().to_string()])),
            )
            .unwrap(),
        );

        let results = Tier1Engine::new(&registry).run("태그 #딥테크");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "keywords.hashtag");
        assert_eq!(results[0].value, Some(FieldValue::List(vec!["딥테크".to_string()])));
    }

    proptest! {
        #[test]
        fn prop_tier1_is_idempotent(text in "\\PC{0,200}") {
            prop_assert_eq!(run_tier1(&text), run_tier1(&text));
        }

        #[test]
        fn prop_tier1_never_panics_on_announcement_like_text(
            label in "(접수마감일|총 사업비|협약기간|문의처|소재지)",
            body in "[0-9가-힣 .:~,%-]{0,40}",
        ) {
            let text = format!("{}: {}", label, body);
            let results = run_tier1(&text);
            prop_assert!(results.iter().all(|r| r.value.is_some()));
        }
    }
}
