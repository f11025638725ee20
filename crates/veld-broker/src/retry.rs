//! Exponential backoff retry for broker calls.

use crate::error::BrokerError;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy configuration.
///
/// Only transient errors ([`BrokerError::is_transient`]) are retried;
/// `Rejected` and `Auth` are terminal for the current step.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (0 = no retries).
    pub max_retries: u32,
    /// Base delay in seconds for exponential backoff.
    pub base_delay_secs: u64,
    /// Maximum delay cap in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_secs: 1,
            max_delay_secs: 30,
        }
    }
}

impl RetryPolicy {
    /// Policy with the given retry count and base delay, capped at 30s.
    #[must_use]
    pub fn new(max_retries: u32, base_delay_secs: u64) -> Self {
        Self {
            max_retries,
            base_delay_secs,
            max_delay_secs: 30,
        }
    }

    /// Policy that never retries. Used by tests and one-shot admin tooling.
    #[must_use]
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    /// Whether the error should be retried at the given attempt number.
    #[must_use]
    pub fn should_retry(&self, attempt: u32, error: &BrokerError) -> bool {
        attempt < self.max_retries && error.is_transient()
    }

    /// Delay before the next attempt.
    ///
    /// A [`BrokerError::RateLimited`] hint is honored directly (capped at
    /// `max_delay_secs`); otherwise `min(base * 2^attempt, max)`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, error: &BrokerError) -> Duration {
        let secs = if let BrokerError::RateLimited { retry_after_secs } = error {
            (*retry_after_secs).min(self.max_delay_secs)
        } else {
            self.base_delay_secs
                .saturating_mul(2u64.saturating_pow(attempt))
                .min(self.max_delay_secs)
        };
        Duration::from_secs(secs)
    }

    /// Run an async broker operation with retry.
    ///
    /// Terminal errors return immediately. After the last transient failure
    /// the underlying error is returned unchanged so callers keep the full
    /// taxonomy; the exhausted attempt count is logged at `warn`.
    pub async fn execute<F, Fut, T>(
        &self,
        operation_name: &str,
        mut f: F,
    ) -> Result<T, BrokerError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, BrokerError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match f().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(
                            operation = operation_name,
                            attempt = attempt + 1,
                            "broker call succeeded after retries"
                        );
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if !self.should_retry(attempt, &error) {
                        if error.is_transient() && attempt >= self.max_retries {
                            warn!(
                                operation = operation_name,
                                attempts = attempt + 1,
                                error = %error,
                                "broker call exhausted retries"
                            );
                        }
                        return Err(error);
                    }

                    let delay = self.delay_for(attempt, &error);
                    debug!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_secs = delay.as_secs(),
                        error = %error,
                        "retrying broker call after transient error"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay_secs, 1);
        assert_eq!(policy.max_delay_secs, 30);
    }

    #[test]
    fn transient_errors_are_retried_until_max() {
        let policy = RetryPolicy::new(2, 1);
        let err = BrokerError::unavailable("down");
        assert!(policy.should_retry(0, &err));
        assert!(policy.should_retry(1, &err));
        assert!(!policy.should_retry(2, &err));
    }

    #[test]
    fn terminal_errors_are_never_retried() {
        let policy = RetryPolicy::new(5, 1);
        let rejected = BrokerError::Rejected {
            status: 400,
            message: "bad".into(),
        };
        let auth = BrokerError::Auth("expired".into());
        assert!(!policy.should_retry(0, &rejected));
        assert!(!policy.should_retry(0, &auth));
    }

    #[test]
    fn delay_grows_exponentially_and_caps() {
        let policy = RetryPolicy {
            max_retries: 10,
            base_delay_secs: 1,
            max_delay_secs: 8,
        };
        let err = BrokerError::unavailable("down");
        assert_eq!(policy.delay_for(0, &err), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1, &err), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2, &err), Duration::from_secs(4));
        assert_eq!(policy.delay_for(5, &err), Duration::from_secs(8)); // capped
    }

    #[test]
    fn rate_limit_hint_is_honored() {
        let policy = RetryPolicy::new(3, 1);
        let err = BrokerError::RateLimited {
            retry_after_secs: 7,
        };
        assert_eq!(policy.delay_for(0, &err), Duration::from_secs(7));

        let policy = RetryPolicy {
            max_retries: 3,
            base_delay_secs: 1,
            max_delay_secs: 5,
        };
        assert_eq!(policy.delay_for(0, &err), Duration::from_secs(5)); // capped
    }

    #[tokio::test]
    async fn execute_succeeds_first_try() {
        let policy = RetryPolicy::new(3, 0);
        let result = policy
            .execute("op", || async { Ok::<_, BrokerError>(1) })
            .await;
        assert_eq!(result.unwrap(), 1);
    }

    #[tokio::test]
    async fn execute_retries_transient_then_succeeds() {
        let policy = RetryPolicy::new(3, 0);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = policy
            .execute("op", move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(BrokerError::unavailable("down"))
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn execute_returns_terminal_error_immediately() {
        let policy = RetryPolicy::new(3, 0);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = policy
            .execute("op", move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(BrokerError::Auth("nope".into()))
                }
            })
            .await;

        assert!(matches!(result, Err(BrokerError::Auth(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn execute_returns_last_transient_error_after_exhaustion() {
        let policy = RetryPolicy::new(2, 0);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = policy
            .execute("op", move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(BrokerError::unavailable("still down"))
                }
            })
            .await;

        assert!(matches!(result, Err(BrokerError::Unavailable { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3); // initial + 2 retries
    }
}
