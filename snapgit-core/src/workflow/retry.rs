//! Bounded retry for network operations

use std::future::Future;
use std::time::Duration;

use crate::Result;

/// Retry transient failures a bounded number of times with exponential backoff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first (1 = never retry)
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_backoff: Duration,
    /// Growth factor per retry
    pub multiplier: u32,
    /// Upper bound on any single delay
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_backoff: Duration::from_secs(1),
            multiplier: 2,
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// A policy that runs the operation exactly once
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (0-based): base * multiplier^retry, capped
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(retry);
        self.base_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Run `operation`, retrying while it fails with a transient error
    ///
    /// The closure receives the 1-based attempt number. Permanent errors and
    /// the error from the final attempt are returned unchanged.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.backoff_for(attempt - 1);
                    tracing::warn!(
                        operation = label,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::cell::Cell;

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_backoff: Duration::ZERO,
            multiplier: 2,
            max_backoff: Duration::ZERO,
        }
    }

    fn transient() -> Error {
        Error::Network {
            message: "Could not resolve host".to_string(),
            transient: true,
        }
    }

    #[test]
    fn test_calculates_exponential_backoff() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_backoff: Duration::from_millis(500),
            multiplier: 3,
            max_backoff: Duration::from_secs(60),
        };
        assert_eq!(policy.backoff_for(0), Duration::from_millis(500));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(1500));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(4500));
    }

    #[test]
    fn test_backoff_respects_max_limit() {
        let policy = RetryPolicy {
            max_backoff: Duration::from_secs(3),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff_for(10), Duration::from_secs(3));
        assert_eq!(policy.backoff_for(u32::MAX), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_transient_error_retried_once_then_surfaced() {
        let calls = Cell::new(0);
        let result: Result<()> = fast(2)
            .run("fetch", |_| {
                calls.set(calls.get() + 1);
                async { Err(transient()) }
            })
            .await;

        assert!(matches!(result, Err(Error::Network { .. })));
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let calls = Cell::new(0);
        let result: Result<()> = fast(5)
            .run("push", |_| {
                calls.set(calls.get() + 1);
                async { Err(Error::PushRejected("[rejected]".to_string())) }
            })
            .await;

        assert!(matches!(result, Err(Error::PushRejected(_))));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_succeeds_on_second_attempt() {
        let result = fast(2)
            .run("fetch", |attempt| async move {
                if attempt == 1 {
                    Err(transient())
                } else {
                    Ok(attempt)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_no_retry_policy_runs_once() {
        let calls = Cell::new(0);
        let _ = RetryPolicy::no_retry()
            .run("fetch", |_| {
                calls.set(calls.get() + 1);
                async { Err::<(), _>(transient()) }
            })
            .await;
        assert_eq!(calls.get(), 1);
    }
}
