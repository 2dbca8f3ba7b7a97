//! Error types for the extraction pipeline

use thiserror::Error;

/// Errors that can occur inside one tier
///
/// The orchestrator catches all of these; they never escape
/// [`Orchestrator::extract`](crate::Orchestrator::extract).
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Provider call exceeded the configured timeout
    #[error("LLM call timed out after {0}s")]
    Timeout(u64),

    /// Blocking task could not be joined
    #[error("Task join error: {0}")]
    Join(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let cases = [
            (ExtractorError::Llm("connection refused".into()), "LLM error: connection refused"),
            (ExtractorError::Timeout(30), "LLM call timed out after 30s"),
            (ExtractorError::Join("cancelled".into()), "Task join error: cancelled"),
        ];
        for (error, expected) in cases {
            // Every variant is produced by the provider call path
            match &error {
                ExtractorError::Llm(_) | ExtractorError::Timeout(_) | ExtractorError::Join(_) => {}
            }
            assert_eq!(error.to_string(), expected);
        }
    }
}
