//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use gonggo_extractor::JobInput;
use std::fs;
use std::path::Path;
use tracing::info;

/// Execute the extract command.
pub async fn execute_extract(args: ExtractArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let job_id = args
        .job_id
        .unwrap_or_else(|| uuid::Uuid::now_v7().to_string());
    let input = read_job(&job_id, &args.file, args.html.as_deref(), args.description.as_deref())?;

    let orchestrator = super::build_orchestrator(config)?;
    info!("Extracting {} from {}", job_id, args.file.display());
    let outcome = orchestrator.extract(input).await;

    println!("{}", formatter.format_outcome(&outcome)?);
    Ok(())
}

/// Assemble a job from files on disk.
pub(crate) fn read_job(
    job_id: &str,
    text: &Path,
    html: Option<&Path>,
    description: Option<&Path>,
) -> Result<JobInput> {
    let mut input = JobInput::new(job_id, fs::read_to_string(text)?);
    if let Some(path) = html {
        input = input.with_detail_html(fs::read_to_string(path)?);
    }
    if let Some(path) = description {
        input = input.with_description(fs::read_to_string(path)?);
    }
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_job_with_all_sources() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("notice.txt");
        let html = dir.path().join("detail.html");
        let desc = dir.path().join("desc.txt");
        fs::write(&text, "접수마감일: 2025-03-15").unwrap();
        fs::write(&html, "<p>문의처: 02-123-4567</p>").unwrap();
        fs::write(&desc, "창업기업 지원").unwrap();

        let input = read_job("job-1", &text, Some(&html), Some(&desc)).unwrap();
        assert_eq!(input.job_id, "job-1");
        assert_eq!(input.document_text.as_deref(), Some("접수마감일: 2025-03-15"));
        assert!(input.detail_html.unwrap().contains("문의처"));
        assert_eq!(input.description.as_deref(), Some("창업기업 지원"));
    }

    #[test]
    fn test_read_job_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_job("job-1", &dir.path().join("absent.txt"), None, None);
        assert!(matches!(result, Err(crate::error::CliError::Io(_))));
    }
}
