//! Bounded retry with linear backoff for collaborator calls.
//!
//! Every outbound generation call is wrapped in [`with_retry`]: a fixed
//! attempt count and a delay that grows linearly with the attempt number.
//! Callers above this layer never see intermediate failures, only the
//! final outcome.

use std::future::Future;
use std::time::Duration;

use crate::error::GenAiError;

/// Tunable parameters for the linear-backoff strategy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Base delay; attempt `n` waits `base_delay * n` before retrying.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Delay to wait after the given 1-based failed attempt.
pub fn delay_after_attempt(attempt: u32, policy: &RetryPolicy) -> Duration {
    policy.base_delay * attempt
}

/// Run `op` up to `policy.max_attempts` times, sleeping a linearly growing
/// delay between attempts. Returns the first success or the last error.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, GenAiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GenAiError>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= policy.max_attempts => {
                tracing::warn!(attempt, error = %e, "Giving up after final attempt");
                return Err(e);
            }
            Err(e) => {
                let delay = delay_after_attempt(attempt, policy);
                tracing::warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Attempt failed, retrying",
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn delay_grows_linearly() {
        let policy = RetryPolicy::default();
        assert_eq!(delay_after_attempt(1, &policy), Duration::from_secs(1));
        assert_eq!(delay_after_attempt(2, &policy), Duration::from_secs(2));
        assert_eq!(delay_after_attempt(3, &policy), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn first_attempt_success_does_not_retry() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&RetryPolicy::default(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, GenAiError>(42)
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_late_attempt() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&RetryPolicy::default(), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(GenAiError::Empty("flaky".to_string()))
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, _> = with_retry(&RetryPolicy::default(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(GenAiError::Empty("always failing".to_string()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn last_error_is_surfaced() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, _> = with_retry(&RetryPolicy::default(), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            Err(GenAiError::Empty(format!("failure {n}")))
        })
        .await;
        let message = result.unwrap_err().to_string();
        assert_eq!(message, "failure 3");
    }

    #[tokio::test(start_paused = true)]
    async fn single_attempt_policy_never_sleeps() {
        let policy = RetryPolicy {
            max_attempts: 1,
            base_delay: Duration::from_secs(3600),
        };
        let result: Result<u32, _> = with_retry(&policy, || async {
            Err(GenAiError::Empty("nope".to_string()))
        })
        .await;
        assert!(result.is_err());
    }
}
