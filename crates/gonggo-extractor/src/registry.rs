//! Field registry - the rule table behind the pattern tier
//!
//! Every field owns a [`RuleChain`]: an explicit, ordered list of
//! [`PatternRule`]s. Matching walks rules in registration order and, within
//! a rule, patterns in order. The first pattern that matches *and* whose
//! post-processor yields a value wins; iteration stops there. A match the
//! post-processor rejects counts as no match and iteration continues.
//!
//! # Examples
//!
//! ```
//! use gonggo_extractor::{PatternRegistry, PatternRule};
//! use gonggo_domain::{Confidence, Field, FieldValue};
//!
//! let rule = PatternRule::new(
//!     "contact.phone",
//!     Field::Contact,
//!     Confidence::Medium,
//!     &[r"(?P<v>0\d{1,2}-\d{3,4}-\d{4})"],
//!     |caps| caps.name("v").map(|m| FieldValue::Text(m.as_str().to_string())),
//! )
//! .unwrap();
//!
//! let mut registry = PatternRegistry::new();
//! registry.register(rule);
//!
//! let hit = registry.chain(Field::Contact).unwrap().first_match("문의: 02-123-4567").unwrap();
//! assert_eq!(hit.rule, "contact.phone");
//! ```

use crate::rules;
use gonggo_domain::{Confidence, Field, FieldValue};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Turns a raw match into a typed value; `None` rejects the match
pub type PostProcessor = fn(&Captures<'_>) -> Option<FieldValue>;

static STANDARD: LazyLock<PatternRegistry> = LazyLock::new(rules::standard_registry);

/// One rule: ordered patterns sharing a post-processor and a confidence
#[derive(Debug, Clone)]
pub struct PatternRule {
    name: &'static str,
    field: Field,
    confidence: Confidence,
    patterns: Vec<Regex>,
    post: PostProcessor,
}

impl PatternRule {
    /// Compile a rule
    ///
    /// # Errors
    ///
    /// Returns the first pattern that fails to compile.
    pub fn new(
        name: &'static str,
        field: Field,
        confidence: Confidence,
        patterns: &[&str],
        post: PostProcessor,
    ) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name,
            field,
            confidence,
            patterns,
            post,
        })
    }

    /// Rule name, reported as the result source
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Target field
    pub fn field(&self) -> Field {
        self.field
    }

    /// Confidence assigned on a successful match
    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    /// Number of patterns in the rule
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// First value produced by any of this rule's patterns
    pub fn apply(&self, text: &str) -> Option<FieldValue> {
        self.patterns.iter().find_map(|re| {
            // Only the first occurrence of each pattern is considered
            re.captures(text).and_then(|caps| (self.post)(&caps))
        })
    }
}

/// A successful rule application
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    /// Name of the winning rule
    pub rule: &'static str,
    /// Extracted value
    pub value: FieldValue,
    /// The winning rule's declared confidence
    pub confidence: Confidence,
}

/// Ordered rules for one field
#[derive(Debug, Clone, Default)]
pub struct RuleChain {
    rules: Vec<PatternRule>,
}

impl RuleChain {
    /// Append a rule at the lowest priority
    pub fn push(&mut self, rule: PatternRule) {
        self.rules.push(rule);
    }

    /// Rules in priority order
    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// Whether the chain has no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply rules in order and stop at the first one producing a value
    pub fn first_match(&self, text: &str) -> Option<RuleMatch> {
        self.rules.iter().find_map(|rule| {
            rule.apply(text).map(|value| RuleMatch {
                rule: rule.name,
                value,
                confidence: rule.confidence,
            })
        })
    }
}

/// Rule chains for every field
#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    chains: BTreeMap<Field, RuleChain>,
}

impl PatternRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in rule table, compiled once per process
    pub fn standard() -> &'static PatternRegistry {
        &STANDARD
    }

    /// Append a rule to its field's chain
    pub fn register(&mut self, rule: PatternRule) {
        self.chains.entry(rule.field).or_default().push(rule);
    }

    /// Chain for a field, if any rule targets it
    pub fn chain(&self, field: Field) -> Option<&RuleChain> {
        self.chains.get(&field).filter(|c| !c.is_empty())
    }

    /// Total rules across all fields
    pub fn rule_count(&self) -> usize {
        self.chains.values().map(|c| c.rules.len()).sum()
    }

    /// Fields without any rule, in declaration order
    pub fn uncovered_fields(&self) -> Vec<Field> {
        Field::ALL
            .iter()
            .copied()
            .filter(|f| self.chain(*f).is_none())
            .collect()
    }

    /// Every rule, grouped by field in declaration order
    pub fn rules(&self) -> impl Iterator<Item = &PatternRule> {
        self.chains.values().flat_map(|c| c.rules.iter())
    }
}
