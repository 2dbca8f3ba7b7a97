//! Command implementations.

mod batch;
mod config;
mod extract;
mod feedback;
mod patterns;

pub use batch::execute_batch;
pub use config::execute_config;
pub use extract::execute_extract;
pub use feedback::execute_feedback;
pub use patterns::execute_patterns;

use crate::config::Config;
use crate::error::Result;
use gonggo_extractor::Orchestrator;
use gonggo_llm::ConfiguredProvider;
use gonggo_store::SqliteStore;
use std::fs;
use tracing::debug;

/// Orchestrator wired to configured providers and the SQLite store.
pub type CliOrchestrator = Orchestrator<ConfiguredProvider, ConfiguredProvider, SqliteStore>;

/// Open the configured database, creating its directory when needed.
pub(crate) fn open_store(config: &Config) -> Result<SqliteStore> {
    let path = config.database_path()?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    debug!("Opening store at {}", path.display());
    Ok(SqliteStore::new(&path)?)
}

/// Build an orchestrator; providers are only constructed for tiers that can run.
pub(crate) fn build_orchestrator(config: &Config) -> Result<CliOrchestrator> {
    let store = open_store(config)?;
    let pipeline = &config.pipeline;
    let mut orchestrator = Orchestrator::new(pipeline.clone(), store);

    if pipeline.tier2_enabled {
        let provider = ConfiguredProvider::from_config(&config.tier2_provider)?;
        debug!("Tier 2 provider: {:?} {}", config.tier2_provider.kind, config.tier2_provider.model);
        orchestrator = orchestrator.with_tier2(provider);
    }

    if pipeline.tier3_enabled || pipeline.force_tier3 {
        let provider = ConfiguredProvider::from_config(&config.tier3_provider)?;
        debug!("Tier 3 provider: {:?} {}", config.tier3_provider.kind, config.tier3_provider.model);
        orchestrator = orchestrator.with_tier3(provider);
    }

    Ok(orchestrator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gonggo_llm::{ProviderConfig, ProviderKind};

    fn mock_config(dir: &tempfile::TempDir) -> Config {
        let mut config = Config::default();
        config.storage.database = Some(dir.path().join("db").join("gonggo.db"));
        config.tier2_provider = ProviderConfig {
            kind: ProviderKind::Mock,
            ..ProviderConfig::small_default()
        };
        config.tier3_provider = ProviderConfig {
            kind: ProviderKind::Mock,
            ..ProviderConfig::large_default()
        };
        config
    }

    #[test]
    fn test_open_store_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = mock_config(&dir);
        open_store(&config).unwrap();
        assert!(dir.path().join("db").join("gonggo.db").exists());
    }

    #[test]
    fn test_disabled_tiers_skip_provider_setup() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = mock_config(&dir);
        config.pipeline.tier2_enabled = false;
        config.pipeline.tier3_enabled = false;
        // An unusable provider is never constructed when its tier is off
        config.tier2_provider = ProviderConfig {
            kind: ProviderKind::OpenAi,
            api_key_env: None,
            ..ProviderConfig::small_default()
        };
        assert!(build_orchestrator(&config).is_ok());
    }

    #[test]
    fn test_missing_api_key_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = mock_config(&dir);
        config.tier2_provider = ProviderConfig {
            kind: ProviderKind::Anthropic,
            api_key_env: None,
            ..ProviderConfig::large_default()
        };
        assert!(matches!(
            build_orchestrator(&config),
            Err(crate::error::CliError::Llm(_))
        ));
    }
}
