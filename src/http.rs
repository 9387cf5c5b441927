// Shared HTTP plumbing for the Ollama and chat-completion clients

use anyhow::Result;
use std::time::Duration;
use tracing::{debug, error, warn};

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

/// Build a blocking agent with a global request timeout
#[inline]
pub fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

/// Run `request_fn` up to `attempts` times.
///
/// Server errors (5xx) and transport failures are retried with exponential
/// backoff; client errors and everything else fail on the first attempt.
/// With `attempts == 1` this is a single call.
#[inline]
pub fn make_request_with_retry<F>(target: &str, attempts: u32, mut request_fn: F) -> Result<String>
where
    F: FnMut() -> Result<String, ureq::Error>,
{
    let attempts = attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        debug!("HTTP request attempt {}/{}", attempt, attempts);

        match request_fn() {
            Ok(response_text) => {
                debug!("Request succeeded on attempt {}", attempt);
                return Ok(response_text);
            }
            Err(error) => {
                let should_retry = match &error {
                    ureq::Error::StatusCode(status) => {
                        if *status >= 500 {
                            warn!(
                                "Server error (status {}), attempt {}/{}",
                                status, attempt, attempts
                            );
                            true
                        } else {
                            warn!("Client error (status {}), not retrying", status);
                            return Err(anyhow::anyhow!("Client error: HTTP {}", status));
                        }
                    }
                    ureq::Error::ConnectionFailed
                    | ureq::Error::HostNotFound
                    | ureq::Error::Timeout(_)
                    | ureq::Error::Io(_) => {
                        warn!(
                            "Transport error: {}, attempt {}/{}",
                            error, attempt, attempts
                        );
                        true
                    }
                    _ => {
                        warn!("Non-retryable error: {}", error);
                        false
                    }
                };

                if !should_retry {
                    return Err(anyhow::anyhow!("Non-retryable error: {}", error));
                }

                last_error = Some(anyhow::anyhow!("Request error: {}", error));

                if attempt < attempts {
                    let delay_ms = EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * 1000;
                    let delay = Duration::from_millis(delay_ms);
                    debug!("Waiting {:?} before retry", delay);
                    std::thread::sleep(delay);
                }
            }
        }
    }

    error!("All {} attempt(s) failed for request to {}", attempts, target);

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Request failed after retries")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_success_is_returned() {
        let mut calls = 0;
        let result = make_request_with_retry("test", 3, || {
            calls += 1;
            Ok("ok".to_string())
        });

        assert_eq!(result.expect("request should succeed"), "ok");
        assert_eq!(calls, 1);
    }

    #[test]
    fn client_errors_are_not_retried() {
        let mut calls = 0;
        let result = make_request_with_retry("test", 3, || {
            calls += 1;
            Err(ureq::Error::StatusCode(404))
        });

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn single_attempt_does_not_retry_server_errors() {
        let mut calls = 0;
        let result = make_request_with_retry("test", 1, || {
            calls += 1;
            Err(ureq::Error::StatusCode(503))
        });

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn zero_attempts_still_calls_once() {
        let mut calls = 0;
        let _ = make_request_with_retry("test", 0, || {
            calls += 1;
            Ok(String::new())
        });
        assert_eq!(calls, 1);
    }
}
