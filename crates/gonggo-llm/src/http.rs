//! Shared HTTP plumbing: retries with exponential backoff and status mapping

use crate::LlmError;
use std::time::Duration;
use tracing::{debug, warn};

/// Largest error body kept in error messages
const MAX_ERROR_BODY_CHARS: usize = 256;

/// Send a request built by `build` until it succeeds or retries run out
///
/// Returns the response body of the first 2xx response. A 404 is reported
/// as [`LlmError::ModelNotAvailable`] without retrying; 429 and other
/// failures are retried with delays of 1s, 2s, 4s, ...
pub(crate) async fn send_with_retry<F>(
    build: F,
    model: &str,
    max_retries: u32,
) -> Result<String, LlmError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut attempts = 0;
    let mut last_error = None;

    while attempts < max_retries.max(1) {
        match build().send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return response
                        .text()
                        .await
                        .map_err(|e| LlmError::InvalidResponse(format!("Failed to read body: {}", e)));
                }
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(LlmError::ModelNotAvailable(model.to_string()));
                }
                if status == reqwest::StatusCode::UNAUTHORIZED
                    || status == reqwest::StatusCode::FORBIDDEN
                {
                    return Err(LlmError::Config(format!("HTTP {}: check API key", status)));
                }
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    last_error = Some(LlmError::RateLimitExceeded);
                } else {
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    last_error = Some(LlmError::Communication(format!(
                        "HTTP {}: {}",
                        status,
                        shorten(&body)
                    )));
                }
            }
            Err(e) => {
                last_error = Some(LlmError::Communication(format!("Request failed: {}", e)));
            }
        }

        attempts += 1;
        if attempts < max_retries {
            // Exponential backoff: 1s, 2s, 4s, etc.
            let delay = Duration::from_secs(2u64.pow(attempts - 1));
            warn!("Model call to '{}' failed, retrying in {:?}", model, delay);
            tokio::time::sleep(delay).await;
        }
    }

    debug!("Giving up on '{}' after {} attempts", model, attempts);
    Err(last_error.unwrap_or_else(|| LlmError::Communication("Max retries exceeded".to_string())))
}

fn shorten(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MAX_ERROR_BODY_CHARS {
        let short: String = collapsed.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{}...[truncated]", short)
    } else {
        collapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten_collapses_and_truncates() {
        assert_eq!(shorten("a \n  b"), "a b");
        let long = "x".repeat(400);
        let short = shorten(&long);
        assert!(short.ends_with("...[truncated]"));
        assert_eq!(short.chars().count(), MAX_ERROR_BODY_CHARS + "...[truncated]".len());
    }
}
