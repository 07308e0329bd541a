//! Exponential backoff retry for operational failures

use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;
use crate::error::ScanError;

/// Backoff schedule for [`retry_with_backoff`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total invocations = max_retries + 1.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Delay before retry `attempt` (0-based): `base * 2^attempt` plus up to
    /// 30% jitter, capped at `max_delay`.
    fn delay_for(&self, attempt: u32) -> Duration {
        let exp_ms = self
            .base_delay
            .as_millis()
            .saturating_mul(1u128 << attempt.min(32)) as u64;
        let jitter_ms = {
            let mut rng = rand::thread_rng();
            rng.gen_range(0.0..=0.3) * exp_ms as f64
        };
        Duration::from_millis(exp_ms.saturating_add(jitter_ms as u64)).min(self.max_delay)
    }
}

/// Invoke `operation` until it succeeds, its error is non-retryable, or
/// retries are exhausted; the last error is returned as-is.
///
/// Retry eligibility is decided by [`ScanError::is_retryable`]: only
/// operational failures (rate limits, timeouts, transient remote faults)
/// qualify. Validation and access errors surface on the first attempt.
pub async fn retry_with_backoff<F, Fut, T>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, ScanError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScanError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if !error.is_retryable() || attempt >= policy.max_retries {
                    return Err(error);
                }
                let delay = policy.delay_for(attempt);
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, %error, "retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn retryable_failure_invokes_max_retries_plus_one() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = retry_with_backoff(&fast_policy(3), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ScanError::RateLimit("always".into()))
            }
        })
        .await;

        assert!(matches!(result, Err(ScanError::RateLimit(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn non_retryable_failure_invokes_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = retry_with_backoff(&fast_policy(3), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ScanError::Validation("bad input".into()))
            }
        })
        .await;

        assert!(matches!(result, Err(ScanError::Validation(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn eventual_success_stops_retrying() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = retry_with_backoff(&fast_policy(5), move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ScanError::Timeout { seconds: 1 })
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn delay_is_capped_at_max() {
        let policy = RetryPolicy {
            max_retries: 10,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(2500),
        };
        assert!(policy.delay_for(8) <= Duration::from_millis(2500));
    }
}
