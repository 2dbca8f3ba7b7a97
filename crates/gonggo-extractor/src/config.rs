//! Configuration for the three-tier pipeline
//!
//! A [`ThreeTierConfig`] is built once (from defaults, TOML, or the process
//! environment) and handed to the orchestrator. Tier logic never reads the
//! environment itself.

use crate::cost::ModelRates;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable enabling the focused model tier
pub const ENV_TIER2_ENABLED: &str = "GONGGO_TIER2_ENABLED";
/// Environment variable enabling the escalation tier
pub const ENV_TIER3_ENABLED: &str = "GONGGO_TIER3_ENABLED";
/// Environment variable for the focused tier's per-job ceiling in won
pub const ENV_TIER2_MAX_COST: &str = "GONGGO_TIER2_MAX_COST_KRW";
/// Environment variable for the escalation tier's per-job ceiling in won
pub const ENV_TIER3_MAX_COST: &str = "GONGGO_TIER3_MAX_COST_KRW";
/// Environment variable forcing escalation on every job
pub const ENV_FORCE_TIER3: &str = "GONGGO_FORCE_TIER3";

/// Thresholds deciding when a job escalates to the full-document tier
///
/// Any one condition suffices:
/// - unresolved share of all fields exceeds `missing_ratio_threshold`
/// - rules resolved fewer than `min_tier1_fields` and the focused tier
///   resolved less than `tier2_success_ratio` of what it attempted
/// - trimmed text is shorter than `min_text_chars`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationPolicy {
    /// Share of unresolved fields above which the job escalates
    pub missing_ratio_threshold: f64,

    /// Rule-resolved field count below which the layout counts as unseen
    pub min_tier1_fields: usize,

    /// Focused-tier success share below which the layout counts as unseen
    pub tier2_success_ratio: f64,

    /// Character count below which the text counts as missing
    pub min_text_chars: usize,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            missing_ratio_threshold: 0.5,
            min_tier1_fields: 3,
            tier2_success_ratio: 0.5,
            min_text_chars: 100,
        }
    }
}

/// Configuration for the extraction pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreeTierConfig {
    /// Run the focused model tier for fields the rules missed
    pub tier2_enabled: bool,

    /// Allow escalation to the full-document tier
    pub tier3_enabled: bool,

    /// Per-job ceiling checked before each focused-tier call (won)
    pub tier2_max_cost_krw: f64,

    /// Per-job ceiling checked before the escalation call (won)
    pub tier3_max_cost_krw: f64,

    /// Escalate every job regardless of conditions
    pub force_tier3: bool,

    /// Characters of document text sent to the focused tier
    pub tier2_max_chars: usize,

    /// Characters of document text sent to the escalation tier
    pub tier3_max_chars: usize,

    /// Maximum time for a single model call (seconds)
    pub call_timeout_secs: u64,

    /// Escalation thresholds
    pub escalation: EscalationPolicy,

    /// Focused-tier model prices
    pub tier2_rates: ModelRates,

    /// Escalation-tier model prices
    pub tier3_rates: ModelRates,
}

impl Default for ThreeTierConfig {
    fn default() -> Self {
        Self {
            tier2_enabled: true,
            tier3_enabled: true,
            tier2_max_cost_krw: 50.0,
            tier3_max_cost_krw: 500.0,
            force_tier3: false,
            tier2_max_chars: 8_000,
            tier3_max_chars: 30_000,
            call_timeout_secs: 120,
            escalation: EscalationPolicy::default(),
            tier2_rates: ModelRates::small_model(),
            tier3_rates: ModelRates::large_model(),
        }
    }
}

impl ThreeTierConfig {
    /// Get the per-call timeout as a Duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Conservative preset: no escalation, tight focused-tier budget
    pub fn conservative() -> Self {
        Self {
            tier3_enabled: false,
            tier2_max_cost_krw: 20.0,
            tier3_max_cost_krw: 100.0,
            tier2_max_chars: 6_000,
            call_timeout_secs: 60,
            ..Self::default()
        }
    }

    /// Thorough preset: larger excerpts and budgets
    pub fn thorough() -> Self {
        Self {
            tier2_max_cost_krw: 100.0,
            tier3_max_cost_krw: 1_000.0,
            tier2_max_chars: 12_000,
            tier3_max_chars: 50_000,
            call_timeout_secs: 300,
            ..Self::default()
        }
    }

    /// Defaults overlaid with the `GONGGO_*` environment toggles
    pub fn from_env() -> Result<Self, String> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay toggles read through `lookup` onto this configuration
    ///
    /// Unset variables leave the current value in place; malformed values
    /// are rejected.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_TIER2_ENABLED) {
            self.tier2_enabled = parse_flag(ENV_TIER2_ENABLED, &raw)?;
        }
        if let Some(raw) = lookup(ENV_TIER3_ENABLED) {
            self.tier3_enabled = parse_flag(ENV_TIER3_ENABLED, &raw)?;
        }
        if let Some(raw) = lookup(ENV_TIER2_MAX_COST) {
            self.tier2_max_cost_krw = parse_amount(ENV_TIER2_MAX_COST, &raw)?;
        }
        if let Some(raw) = lookup(ENV_TIER3_MAX_COST) {
            self.tier3_max_cost_krw = parse_amount(ENV_TIER3_MAX_COST, &raw)?;
        }
        if let Some(raw) = lookup(ENV_FORCE_TIER3) {
            self.force_tier3 = parse_flag(ENV_FORCE_TIER3, &raw)?;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.tier2_max_chars == 0 {
            return Err("tier2_max_chars must be greater than 0".to_string());
        }
        if self.tier3_max_chars == 0 {
            return Err("tier3_max_chars must be greater than 0".to_string());
        }
        if self.tier3_max_chars < self.tier2_max_chars {
            return Err("tier3_max_chars cannot be smaller than tier2_max_chars".to_string());
        }
        if !self.tier2_max_cost_krw.is_finite() || self.tier2_max_cost_krw < 0.0 {
            return Err("tier2_max_cost_krw must be a non-negative number".to_string());
        }
        if !self.tier3_max_cost_krw.is_finite() || self.tier3_max_cost_krw < 0.0 {
            return Err("tier3_max_cost_krw must be a non-negative number".to_string());
        }
        if self.call_timeout_secs == 0 {
            return Err("call_timeout_secs must be greater than 0".to_string());
        }
        if !in_unit_interval(self.escalation.missing_ratio_threshold) {
            return Err("escalation.missing_ratio_threshold must be in (0, 1]".to_string());
        }
        if !in_unit_interval(self.escalation.tier2_success_ratio) {
            return Err("escalation.tier2_success_ratio must be in (0, 1]".to_string());
        }
        if !self.tier2_rates.is_valid() || !self.tier3_rates.is_valid() {
            return Err("model rates must be non-negative numbers".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

fn in_unit_interval(value: f64) -> bool {
    value > 0.0 && value <= 1.0
}

fn parse_flag(name: &str, raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("{} must be a boolean, got '{}'", name, other)),
    }
}

fn parse_amount(name: &str, raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("{} must be a number, got '{}'", name, raw.trim()))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{} must be non-negative, got {}", name, value));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ThreeTierConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.tier2_enabled);
        assert!(config.tier3_enabled);
        assert!(!config.force_tier3);
        assert_eq!(config.escalation.min_tier1_fields, 3);
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(ThreeTierConfig::conservative().validate().is_ok());
        assert!(ThreeTierConfig::thorough().validate().is_ok());
        assert!(!ThreeTierConfig::conservative().tier3_enabled);
    }

    #[test]
    fn test_invalid_char_budgets() {
        let mut config = ThreeTierConfig::default();
        config.tier2_max_chars = 0;
        assert!(config.validate().is_err());

        let mut config = ThreeTierConfig::default();
        config.tier3_max_chars = config.tier2_max_chars - 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_thresholds() {
        let mut config = ThreeTierConfig::default();
        config.escalation.missing_ratio_threshold = 0.0;
        assert!(config.validate().is_err());

        let mut config = ThreeTierConfig::default();
        config.escalation.tier2_success_ratio = 1.5;
        assert!(config.validate().is_err());

        let mut config = ThreeTierConfig::default();
        config.tier2_max_cost_krw = -1.0;
        assert!(config.validate().is_err());

        let mut config = ThreeTierConfig::default();
        config.call_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overlay() {
        let mut config = ThreeTierConfig::default();
        config
            .apply_env(lookup_from(&[
                (ENV_TIER2_ENABLED, "false"),
                (ENV_TIER3_MAX_COST, "250.5"),
                (ENV_FORCE_TIER3, "1"),
            ]))
            .unwrap();

        assert!(!config.tier2_enabled);
        assert!(config.tier3_enabled);
        assert_eq!(config.tier3_max_cost_krw, 250.5);
        assert_eq!(config.tier2_max_cost_krw, 50.0);
        assert!(config.force_tier3);
    }

    #[test]
    fn test_env_overlay_rejects_garbage() {
        let mut config = ThreeTierConfig::default();
        assert!(config
            .apply_env(lookup_from(&[(ENV_TIER3_ENABLED, "maybe")]))
            .is_err());
        assert!(config
            .apply_env(lookup_from(&[(ENV_TIER2_MAX_COST, "-3")]))
            .is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ThreeTierConfig::thorough();
        let toml_str = config.to_toml().unwrap();
        let parsed = ThreeTierConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = ThreeTierConfig::from_toml(
            "tier3_enabled = false\n\n[escalation]\nmin_text_chars = 200\n",
        )
        .unwrap();
        assert!(!parsed.tier3_enabled);
        assert_eq!(parsed.escalation.min_text_chars, 200);
        assert_eq!(parsed.escalation.min_tier1_fields, 3);
        assert_eq!(parsed.tier2_max_chars, 8_000);
    }
}
