//! Config command implementation.

use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::{Config, OutputFormat};
use crate::error::Result;
use crate::output::Formatter;
use std::path::Path;

/// Execute the config command.
///
/// `show` prints the effective configuration after environment and flag
/// overrides; `init` writes the defaults to `path` (or the default path).
pub async fn execute_config(
    args: ConfigArgs,
    config: &Config,
    path: Option<&Path>,
    format: OutputFormat,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let rendered = match format {
                OutputFormat::Json => serde_json::to_string_pretty(config)?,
                OutputFormat::Table => config.to_toml()?,
            };
            println!("{}", rendered);
        }
        ConfigAction::Init { force } => {
            let target = match path {
                Some(p) => p.to_path_buf(),
                None => Config::path()?,
            };
            if target.exists() && !force {
                println!(
                    "{}",
                    formatter.warning(&format!(
                        "{} already exists (use --force to overwrite)",
                        target.display()
                    ))
                );
                return Ok(());
            }
            let written = Config::default().save(Some(&target))?;
            println!("{}", formatter.success(&format!("Wrote {}", written.display())));
        }
    }
    Ok(())
}
