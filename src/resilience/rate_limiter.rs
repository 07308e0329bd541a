//! Per-key token bucket rate limiter

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::error::ScanError;

struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket limiter keyed by caller-chosen strings.
///
/// Buckets are created lazily on first use and live for the process
/// lifetime. All bucket mutation happens under one async mutex, so
/// `try_consume` is safe to call from concurrent tasks.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, TokenBucket>>,
    capacity: f64,
    /// Tokens added per millisecond.
    refill_rate: f64,
}

impl RateLimiter {
    /// `capacity` is the burst size; `tokens_per_hour` sets the refill rate.
    pub fn new(capacity: u32, tokens_per_hour: u32) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            capacity: f64::from(capacity),
            refill_rate: f64::from(tokens_per_hour) / 3_600_000.0,
        }
    }

    /// Refill the bucket for `key` proportionally to elapsed time, then take
    /// one token if at least one is available.
    pub async fn try_consume(&self, key: &str) -> bool {
        let mut buckets = self.buckets.lock().await;
        let now = Instant::now();
        let bucket = buckets.entry(key.to_string()).or_insert(TokenBucket {
            tokens: self.capacity,
            last_refill: now,
        });

        let elapsed_ms = now.duration_since(bucket.last_refill).as_millis() as f64;
        bucket.tokens = (bucket.tokens + elapsed_ms * self.refill_rate).min(self.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Poll `try_consume` until a token is available or `max_wait` elapses.
    ///
    /// The poll interval backs off with time already spent waiting:
    /// `min(1000 * 2^(elapsed / 5s), 5000)` milliseconds.
    pub async fn wait_for_token(&self, key: &str, max_wait: Duration) -> Result<(), ScanError> {
        let start = Instant::now();
        loop {
            if self.try_consume(key).await {
                return Ok(());
            }

            let elapsed = start.elapsed();
            if elapsed >= max_wait {
                return Err(ScanError::RateLimit(format!(
                    "no token for key '{key}' within {}ms",
                    max_wait.as_millis()
                )));
            }

            let step = elapsed.as_millis() as u64 / 5_000;
            let backoff_ms = 1_000u64.saturating_mul(1 << step.min(12)).min(5_000);
            let remaining = max_wait - elapsed;
            tokio::time::sleep(Duration::from_millis(backoff_ms).min(remaining)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn burst_up_to_capacity_then_rejects() {
        let limiter = RateLimiter::new(3, 3600);
        assert!(limiter.try_consume("github").await);
        assert!(limiter.try_consume("github").await);
        assert!(limiter.try_consume("github").await);
        assert!(!limiter.try_consume("github").await);
    }

    #[tokio::test]
    async fn keys_have_independent_buckets() {
        let limiter = RateLimiter::new(1, 3600);
        assert!(limiter.try_consume("a").await);
        assert!(!limiter.try_consume("a").await);
        assert!(limiter.try_consume("b").await);
    }

    #[tokio::test]
    async fn refill_is_proportional_to_elapsed_time() {
        // 3_600_000 tokens per hour = 1 token per millisecond.
        let limiter = RateLimiter::new(2, 3_600_000);
        assert!(limiter.try_consume("k").await);
        assert!(limiter.try_consume("k").await);
        assert!(!limiter.try_consume("k").await);

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(limiter.try_consume("k").await);
    }

    #[tokio::test]
    async fn wait_for_token_times_out() {
        // Refill far too slow to produce a token during the wait.
        let limiter = RateLimiter::new(1, 1);
        assert!(limiter.try_consume("k").await);

        let err = limiter
            .wait_for_token("k", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::RateLimit(_)));
    }

    #[tokio::test]
    async fn wait_for_token_succeeds_when_bucket_refills() {
        let limiter = RateLimiter::new(1, 3_600_000);
        assert!(limiter.try_consume("k").await);
        limiter
            .wait_for_token("k", Duration::from_secs(5))
            .await
            .expect("token should refill well within the wait budget");
    }
}
