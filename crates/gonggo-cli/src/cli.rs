//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Gonggo CLI - Extract structured fields from funding announcements.
#[derive(Debug, Parser)]
#[command(name = "gonggo")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "GONGGO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip the small-model tier
    #[arg(long, global = true)]
    pub no_tier2: bool,

    /// Never escalate to the large-model tier
    #[arg(long, global = true)]
    pub no_tier3: bool,

    /// Escalate every document to the large-model tier
    #[arg(long, global = true, conflicts_with = "no_tier3")]
    pub force_tier3: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract fields from one announcement
    Extract(ExtractArgs),

    /// Extract fields from every .txt file in a directory
    Batch(BatchArgs),

    /// Run only the pattern tier (no model calls, no cost)
    Patterns(PatternsArgs),

    /// List stored pattern suggestions
    Feedback(FeedbackArgs),

    /// Show or create the configuration file
    Config(ConfigArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Announcement text file
    pub file: PathBuf,

    /// Detail page HTML
    #[arg(long)]
    pub html: Option<PathBuf>,

    /// Listing description text
    #[arg(short, long)]
    pub description: Option<PathBuf>,

    /// Job identifier (generated when omitted)
    #[arg(short, long)]
    pub job_id: Option<String>,
}

/// Arguments for the batch command.
#[derive(Debug, Parser)]
pub struct BatchArgs {
    /// Directory of .txt announcements
    pub dir: PathBuf,

    /// Pause after each document that used a model (milliseconds)
    #[arg(long)]
    pub delay_ms: Option<u64>,
}

/// Arguments for the patterns command.
#[derive(Debug, Parser)]
pub struct PatternsArgs {
    /// Announcement text file
    pub file: PathBuf,
}

/// Arguments for the feedback command.
#[derive(Debug, Parser)]
pub struct FeedbackArgs {
    /// Only suggestions for this field key (e.g. deadline)
    #[arg(long)]
    pub field: Option<String>,

    /// Only suggestions from this job
    #[arg(long)]
    pub job_id: Option<String>,

    /// Maximum number of suggestions
    #[arg(short, long, default_value = "20")]
    pub limit: usize,

    /// Show suggestion counts per field instead
    #[arg(long)]
    pub counts: bool,
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}
