//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use gonggo_extractor::ThreeTierConfig;
use gonggo_llm::ProviderConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Extraction pipeline settings
    #[serde(default)]
    pub pipeline: ThreeTierConfig,

    /// Provider behind the small-model tier
    #[serde(default = "ProviderConfig::small_default")]
    pub tier2_provider: ProviderConfig,

    /// Provider behind the large-model tier
    #[serde(default = "ProviderConfig::large_default")]
    pub tier3_provider: ProviderConfig,

    /// Persistence settings
    #[serde(default)]
    pub storage: Storage,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// Where costs and pattern suggestions are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Storage {
    /// SQLite database file; `~/.gonggo/gonggo.db` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Pause between batch documents that used a model (milliseconds)
    #[serde(default = "default_delay_ms")]
    pub inter_document_delay_ms: u64,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
}

impl Config {
    /// Get the default configuration directory.
    pub fn dir() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".gonggo"))
    }

    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        Ok(Self::dir()?.join("config.toml"))
    }

    /// Load configuration from `path` (or the default path), falling back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::path()?,
        };

        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path` (or the default path).
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::path()?,
        };

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, self.to_toml()?)?;
        Ok(path)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Overlay `GONGGO_*` environment toggles onto the pipeline settings.
    pub fn apply_env(&mut self) -> Result<()> {
        self.pipeline
            .apply_env(|key| std::env::var(key).ok())
            .map_err(CliError::Config)
    }

    /// Apply command-line tier switches.
    pub fn apply_tier_flags(&mut self, no_tier2: bool, no_tier3: bool, force_tier3: bool) {
        if no_tier2 {
            self.pipeline.tier2_enabled = false;
        }
        if no_tier3 {
            self.pipeline.tier3_enabled = false;
            self.pipeline.force_tier3 = false;
        }
        if force_tier3 {
            self.pipeline.force_tier3 = true;
        }
    }

    /// Check the pipeline settings.
    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate().map_err(CliError::Config)
    }

    /// Resolved database path.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.storage.database {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::dir()?.join("gonggo.db")),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pipeline: ThreeTierConfig::default(),
            tier2_provider: ProviderConfig::small_default(),
            tier3_provider: ProviderConfig::large_default(),
            storage: Storage::default(),
            settings: Settings::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
            inter_document_delay_ms: default_delay_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_delay_ms() -> u64 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use gonggo_llm::ProviderKind;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.settings.color);
        assert_eq!(config.settings.inter_document_delay_ms, 1000);
        assert_eq!(config.tier2_provider.kind, ProviderKind::OpenAi);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [pipeline]
            tier3_enabled = false

            [tier2_provider]
            kind = "ollama"
            model = "qwen2.5:7b"

            [settings]
            format = "json"
            "#,
        )
        .unwrap();

        assert!(!config.pipeline.tier3_enabled);
        assert!(config.pipeline.tier2_enabled);
        assert_eq!(config.tier2_provider.kind, ProviderKind::Ollama);
        assert_eq!(config.tier3_provider.kind, ProviderKind::Anthropic);
        assert_eq!(config.settings.format, OutputFormat::Json);
        assert!(config.settings.color);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.pipeline.tier2_max_cost_krw = 12.5;
        config.storage.database = Some(dir.path().join("test.db"));
        config.save(Some(&path)).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.pipeline.tier2_max_cost_krw, 12.5);
        assert_eq!(loaded.database_path().unwrap(), dir.path().join("test.db"));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.pipeline, ThreeTierConfig::default());
    }

    #[test]
    fn test_tier_flags() {
        let mut config = Config::default();
        config.apply_tier_flags(true, false, true);
        assert!(!config.pipeline.tier2_enabled);
        assert!(config.pipeline.force_tier3);

        let mut config = Config::default();
        config.pipeline.force_tier3 = true;
        config.apply_tier_flags(false, true, false);
        assert!(!config.pipeline.tier3_enabled);
        assert!(!config.pipeline.force_tier3);
    }

    #[test]
    fn test_invalid_pipeline_rejected() {
        let mut config = Config::default();
        config.pipeline.tier2_max_chars = 0;
        assert!(matches!(config.validate(), Err(CliError::Config(_))));
    }
}
