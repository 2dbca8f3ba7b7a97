//! Batch command implementation.

use crate::cli::BatchArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use gonggo_domain::TierLevel;
use gonggo_extractor::PipelineMetrics;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Execute the batch command.
///
/// Documents run one after another. After any document that reached a
/// paid tier the command pauses so provider rate limits are respected.
pub async fn execute_batch(args: BatchArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let files = list_documents(&args.dir)?;
    let delay = Duration::from_millis(args.delay_ms.unwrap_or(config.settings.inter_document_delay_ms));
    let orchestrator = super::build_orchestrator(config)?;

    let mut metrics = PipelineMetrics::new();
    let mut outcomes = Vec::with_capacity(files.len());

    for (index, path) in files.iter().enumerate() {
        let job_id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| uuid::Uuid::now_v7().to_string());

        let input = match super::extract::read_job(&job_id, path, None, None) {
            Ok(input) => input,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        info!("[{}/{}] {}", index + 1, files.len(), job_id);
        let outcome = orchestrator.extract(input).await;
        metrics.record(&outcome);

        let paid = outcome.highest_tier > TierLevel::Tier1;
        outcomes.push(outcome);

        if paid && index + 1 < files.len() && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    println!("{}", formatter.format_batch(&outcomes, &metrics)?);
    Ok(())
}

/// `.txt` files directly inside `dir`, sorted by name.
pub(crate) fn list_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(CliError::InvalidInput(format!("{} is not a directory", dir.display())));
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_documents_sorted_txt_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join("notes.md"), "skip").unwrap();
        fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let files = list_documents(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_list_documents_rejects_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "a").unwrap();
        assert!(matches!(list_documents(&file), Err(CliError::InvalidInput(_))));
    }
}
