//! Feedback command implementation.

use crate::cli::FeedbackArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use gonggo_domain::Field;
use gonggo_store::FeedbackQuery;

/// Execute the feedback command.
pub async fn execute_feedback(args: FeedbackArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let store = super::open_store(config)?;

    if args.counts {
        let counts = store.feedback_counts()?;
        println!("{}", formatter.format_feedback_counts(&counts)?);
        return Ok(());
    }

    let query = build_query(&args)?;
    let records = store.list_feedback(&query)?;
    println!("{}", formatter.format_feedback(&records)?);
    Ok(())
}

fn build_query(args: &FeedbackArgs) -> Result<FeedbackQuery> {
    let field = match args.field.as_deref() {
        Some(key) => Some(
            Field::from_key(key).ok_or_else(|| CliError::InvalidInput(format!("Unknown field: {}", key)))?,
        ),
        None => None,
    };
    Ok(FeedbackQuery {
        field,
        job_id: args.job_id.clone(),
        limit: Some(args.limit),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(field: Option<&str>) -> FeedbackArgs {
        FeedbackArgs {
            field: field.map(String::from),
            job_id: None,
            limit: 5,
            counts: false,
        }
    }

    #[test]
    fn test_query_from_field_key() {
        let query = build_query(&args(Some("deadline"))).unwrap();
        assert_eq!(query.field, Some(Field::Deadline));
        assert_eq!(query.limit, Some(5));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(matches!(
            build_query(&args(Some("deadlin"))),
            Err(CliError::InvalidInput(_))
        ));
    }
}
