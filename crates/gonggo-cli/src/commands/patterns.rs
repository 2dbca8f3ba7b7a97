//! Patterns command implementation.

use crate::cli::PatternsArgs;
use crate::error::Result;
use crate::output::Formatter;
use gonggo_extractor::{compose_text, run_tier1, JobInput};
use std::fs;

/// Execute the patterns command: rules only, no providers, no store.
pub async fn execute_patterns(args: PatternsArgs, formatter: &Formatter) -> Result<()> {
    let input = JobInput::new("patterns", fs::read_to_string(&args.file)?);
    let results = run_tier1(&compose_text(&input));
    println!("{}", formatter.format_results(&results)?);
    Ok(())
}
