//! Gonggo CLI - Field extraction for funding announcements.

use clap::Parser;
use gonggo_cli::commands;
use gonggo_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> gonggo_cli::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays parseable
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // File, then environment, then flags
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_env()?;
    config.apply_tier_flags(cli.no_tier2, cli.no_tier3, cli.force_tier3);
    config.validate()?;

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Extract(args) => commands::execute_extract(args, &config, &formatter).await?,
        Command::Batch(args) => commands::execute_batch(args, &config, &formatter).await?,
        Command::Patterns(args) => commands::execute_patterns(args, &formatter).await?,
        Command::Feedback(args) => commands::execute_feedback(args, &config, &formatter).await?,
        Command::Config(args) => {
            commands::execute_config(args, &config, cli.config.as_deref(), format, &formatter).await?
        }
    }

    Ok(())
}
