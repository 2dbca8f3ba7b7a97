//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use gonggo_domain::{ExtractionResult, FeedbackRecord, Field};
use gonggo_extractor::{ExtractionOutcome, GroupStatus, PipelineMetrics};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a finished extraction job.
    pub fn format_outcome(&self, outcome: &ExtractionOutcome) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(outcome)?),
            OutputFormat::Table => Ok(self.format_outcome_table(outcome)),
        }
    }

    fn format_outcome_table(&self, outcome: &ExtractionOutcome) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Group", "Value", "Confidence", "Tier", "Source"]);

        for field in Field::ALL {
            match outcome.fields.get(&field) {
                Some(result) => builder.push_record(result_row(result)),
                None => builder.push_record([
                    field.key().to_string(),
                    field.group().letter().to_string(),
                    "-".to_string(),
                    String::new(),
                    String::new(),
                    String::new(),
                ]),
            }
        }

        let mut out = styled(builder);
        out.push('\n');

        let headline = format!(
            "Job {}: coverage {:.1}%, highest tier {}, cost {:.2} KRW, {} ms",
            outcome.job_id,
            outcome.coverage_percent,
            outcome.highest_tier,
            outcome.total_cost_krw,
            outcome.processing_time_ms
        );
        out.push_str(&self.info(&headline));

        for report in &outcome.tier2_groups {
            let line = format!(
                "Group {}: {:?}, {}/{} resolved, {:.2} KRW",
                report.group.letter(),
                report.status,
                report.resolved,
                report.requested,
                report.cost_krw
            );
            out.push('\n');
            out.push_str(&match report.status {
                GroupStatus::Completed => self.info(&line),
                _ => self.warning(&line),
            });
        }

        if !outcome.escalation_reasons.is_empty() {
            let reasons: Vec<String> = outcome
                .escalation_reasons
                .iter()
                .map(|r| format!("{:?}", r))
                .collect();
            out.push('\n');
            out.push_str(&self.warning(&format!("Escalated: {}", reasons.join("; "))));
        }

        if let Some(reasoning) = &outcome.tier3_reasoning {
            out.push('\n');
            out.push_str(&self.info(&format!("Review: {}", reasoning)));
        }

        if !outcome.pattern_suggestions.is_empty() {
            out.push('\n');
            out.push_str(&self.info(&format!(
                "{} pattern suggestion(s) recorded",
                outcome.pattern_suggestions.len()
            )));
        }

        out
    }

    /// Format rule-tier results.
    pub fn format_results(&self, results: &[ExtractionResult]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(results)?),
            OutputFormat::Table => {
                if results.is_empty() {
                    return Ok(self.colorize("No fields matched.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["Field", "Group", "Value", "Confidence", "Tier", "Source"]);
                for result in results {
                    builder.push_record(result_row(result));
                }
                Ok(styled(builder))
            }
        }
    }

    /// Format stored pattern suggestions.
    pub fn format_feedback(&self, records: &[FeedbackRecord]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
            OutputFormat::Table => {
                if records.is_empty() {
                    return Ok(self.colorize("No pattern suggestions found.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["Job", "Field", "Value", "Suggested pattern", "Rule value", "Reason"]);
                for record in records {
                    builder.push_record([
                        record.job_id.clone(),
                        record.field().key().to_string(),
                        record.suggestion.extracted_value.clone(),
                        record.suggestion.suggested_pattern.clone(),
                        record.tier1_value.clone().unwrap_or_else(|| "-".to_string()),
                        record.suggestion.failure_reason.clone(),
                    ]);
                }
                Ok(styled(builder))
            }
        }
    }

    /// Format per-field suggestion counts.
    pub fn format_feedback_counts(&self, counts: &[(Field, u64)]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let map: serde_json::Map<String, serde_json::Value> = counts
                    .iter()
                    .map(|(field, n)| (field.key().to_string(), serde_json::Value::from(*n)))
                    .collect();
                Ok(serde_json::to_string_pretty(&map)?)
            }
            OutputFormat::Table => {
                if counts.is_empty() {
                    return Ok(self.colorize("No pattern suggestions found.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["Field", "Suggestions"]);
                for (field, n) in counts {
                    builder.push_record([field.key().to_string(), n.to_string()]);
                }
                Ok(styled(builder))
            }
        }
    }

    /// Format a batch run: one row per job followed by the totals.
    pub fn format_batch(&self, outcomes: &[ExtractionOutcome], metrics: &PipelineMetrics) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "outcomes": outcomes,
                "metrics": metrics,
            }))?),
            OutputFormat::Table => {
                if outcomes.is_empty() {
                    return Ok(self.colorize("No announcements found.", "yellow"));
                }
                let mut builder = Builder::default();
                builder.push_record(["Job", "Coverage", "Tier", "Cost (KRW)", "Missing"]);
                for outcome in outcomes {
                    builder.push_record([
                        outcome.job_id.clone(),
                        format!("{:.1}%", outcome.coverage_percent),
                        outcome.highest_tier.to_string(),
                        format!("{:.2}", outcome.total_cost_krw),
                        outcome.failed_fields.len().to_string(),
                    ]);
                }
                let mut out = styled(builder);
                out.push('\n');
                out.push_str(&metrics.summary());
                Ok(out)
            }
        }
    }

    /// Format batch totals.
    pub fn format_metrics(&self, metrics: &PipelineMetrics) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(metrics)?),
            OutputFormat::Table => Ok(metrics.summary()),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn result_row(result: &ExtractionResult) -> [String; 6] {
    [
        result.field.key().to_string(),
        result.group.letter().to_string(),
        result
            .value
            .as_ref()
            .map(|v| v.display())
            .unwrap_or_else(|| "-".to_string()),
        result.confidence.to_string(),
        result.tier.to_string(),
        result.source.clone(),
    ]
}

fn styled(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}
