//! Confidence module - certainty tags on extracted values

use serde::{Deserialize, Serialize};
use std::fmt;

/// Extraction certainty tag
///
/// This is a categorical tag, not a probability. It is assigned by the
/// producer of a value: rules declare it, the cheap model tier reports
/// `Medium` for answers and `Low` for nulls, and the escalation tier is
/// always `High`.
///
/// Ordered so that `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    /// No usable value; internal signal of the model tier only
    Low,
    /// Plausible value
    Medium,
    /// Authoritative or exact-pattern value
    High,
}

impl Confidence {
    /// Uppercase name used in reports and storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "LOW",
            Confidence::Medium => "MEDIUM",
            Confidence::High => "HIGH",
        }
    }

    /// Parse from the uppercase name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Some(Confidence::Low),
            "MEDIUM" => Some(Confidence::Medium),
            "HIGH" => Some(Confidence::High),
            _ => None,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(Confidence::Low < Confidence::Medium);
        assert!(Confidence::Medium < Confidence::High);
    }

    #[test]
    fn test_parse() {
        assert_eq!(Confidence::parse("high"), Some(Confidence::High));
        assert_eq!(Confidence::parse(" MEDIUM "), Some(Confidence::Medium));
        assert_eq!(Confidence::parse("certain"), None);
    }

    #[test]
    fn test_serde_uppercase() {
        assert_eq!(serde_json::to_string(&Confidence::High).unwrap(), "\"HIGH\"");
    }
}
