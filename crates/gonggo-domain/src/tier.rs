//! Tier module - stages of the extraction cascade

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of the extraction cascade that produced a value
///
/// Tiers escalate in cost and capability:
/// - Tier1: rule-based patterns, free
/// - Tier2: cheap model, one call per field group
/// - Tier3: expensive model, whole document, authoritative
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum TierLevel {
    /// Rule-based pattern engine
    Tier1,
    /// Focused per-group model pass
    Tier2,
    /// Full-document escalation pass
    Tier3,
}

impl TierLevel {
    /// Numeric tier (1, 2 or 3)
    pub fn number(&self) -> u8 {
        match self {
            TierLevel::Tier1 => 1,
            TierLevel::Tier2 => 2,
            TierLevel::Tier3 => 3,
        }
    }

    /// Parse from the numeric tier
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(TierLevel::Tier1),
            2 => Some(TierLevel::Tier2),
            3 => Some(TierLevel::Tier3),
            _ => None,
        }
    }

    /// Get the next tier in the cascade (for escalation)
    pub fn next(&self) -> Option<Self> {
        match self {
            TierLevel::Tier1 => Some(TierLevel::Tier2),
            TierLevel::Tier2 => Some(TierLevel::Tier3),
            TierLevel::Tier3 => None,
        }
    }

    /// Whether this tier calls a language model
    pub fn is_paid(&self) -> bool {
        !matches!(self, TierLevel::Tier1)
    }
}

impl From<TierLevel> for u8 {
    fn from(tier: TierLevel) -> u8 {
        tier.number()
    }
}

impl TryFrom<u8> for TierLevel {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Self::from_number(n).ok_or_else(|| format!("Invalid tier: {}", n))
    }
}

impl fmt::Display for TierLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier{}", self.number())
    }
}
