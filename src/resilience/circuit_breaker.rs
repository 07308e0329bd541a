//! Circuit breaker for failure isolation
//!
//! Three-state breaker gating every remote call. Consecutive failures while
//! Closed trip the circuit; after a cooling-off period a HalfOpen probe is
//! allowed through, and enough consecutive probe successes close the circuit
//! again. While Open, calls are rejected without invoking the operation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::config::CircuitBreakerConfig;
use crate::error::ScanError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Thresholds and timeouts for a breaker instance.
#[derive(Debug, Clone)]
pub struct BreakerSettings {
    /// Consecutive failures in Closed before opening.
    pub failure_threshold: u32,
    /// Consecutive HalfOpen successes before closing.
    pub success_threshold: u32,
    /// Time the circuit stays Open before allowing a probe.
    pub reset_timeout: Duration,
    /// Per-call timeout; expiry counts as a failure.
    pub request_timeout: Duration,
}

impl BreakerSettings {
    pub fn from_config(config: &CircuitBreakerConfig) -> Self {
        Self {
            failure_threshold: config.failure_threshold,
            success_threshold: config.success_threshold,
            reset_timeout: Duration::from_secs(config.reset_timeout_secs),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    current: CircuitState,
    failures: u32,
    /// Meaningful only while HalfOpen.
    successes: u32,
    last_failure: Option<Instant>,
}

/// Shared-state circuit breaker. Clone-cheap via `Arc`; one instance gates
/// all calls to the remote API.
#[derive(Clone)]
pub struct CircuitBreaker {
    settings: Arc<BreakerSettings>,
    state: Arc<Mutex<BreakerState>>,
}

impl CircuitBreaker {
    pub fn new(settings: BreakerSettings) -> Self {
        Self {
            settings: Arc::new(settings),
            state: Arc::new(Mutex::new(BreakerState {
                current: CircuitState::Closed,
                failures: 0,
                successes: 0,
                last_failure: None,
            })),
        }
    }

    /// Run `operation` under the breaker with the per-call timeout.
    ///
    /// While Open (and within the reset timeout) the operation is not
    /// invoked at all; the call fails fast with `CircuitOpen`.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T, ScanError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ScanError>>,
    {
        if !self.admit().await {
            return Err(ScanError::CircuitOpen);
        }

        match tokio::time::timeout(self.settings.request_timeout, operation()).await {
            Ok(Ok(value)) => {
                self.on_success().await;
                Ok(value)
            }
            Ok(Err(error)) => {
                self.on_failure().await;
                Err(error)
            }
            Err(_) => {
                self.on_failure().await;
                Err(ScanError::Timeout {
                    seconds: self.settings.request_timeout.as_secs(),
                })
            }
        }
    }

    /// Whether the call may proceed, transitioning Open -> HalfOpen when the
    /// reset timeout has elapsed since the last failure.
    async fn admit(&self) -> bool {
        let mut state = self.state.lock().await;
        match state.current {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => match state.last_failure {
                Some(at) if at.elapsed() >= self.settings.reset_timeout => {
                    tracing::info!("circuit breaker half-open, probing remote");
                    state.current = CircuitState::HalfOpen;
                    state.successes = 0;
                    true
                }
                _ => false,
            },
        }
    }

    async fn on_success(&self) {
        let mut state = self.state.lock().await;
        match state.current {
            CircuitState::Closed => {
                state.failures = 0;
            }
            CircuitState::HalfOpen => {
                state.successes += 1;
                if state.successes >= self.settings.success_threshold {
                    tracing::info!("circuit breaker closed after successful probes");
                    state.current = CircuitState::Closed;
                    state.failures = 0;
                    state.successes = 0;
                }
            }
            // No calls execute while Open.
            CircuitState::Open => {}
        }
    }

    async fn on_failure(&self) {
        let mut state = self.state.lock().await;
        state.failures += 1;
        state.last_failure = Some(Instant::now());

        match state.current {
            CircuitState::Closed => {
                if state.failures >= self.settings.failure_threshold {
                    tracing::warn!(failures = state.failures, "circuit breaker opened");
                    state.current = CircuitState::Open;
                }
            }
            CircuitState::HalfOpen => {
                tracing::warn!("probe failed, circuit breaker re-opened");
                state.current = CircuitState::Open;
                state.successes = 0;
            }
            CircuitState::Open => {}
        }
    }

    pub async fn state(&self) -> CircuitState {
        self.state.lock().await.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc as StdArc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn settings(failure_threshold: u32, reset_timeout: Duration) -> BreakerSettings {
        BreakerSettings {
            failure_threshold,
            success_threshold: 2,
            reset_timeout,
            request_timeout: Duration::from_secs(1),
        }
    }

    async fn fail(breaker: &CircuitBreaker) {
        let _ = breaker
            .execute(|| async { Err::<(), _>(ScanError::RemoteApi { status: Some(500), message: "boom".into() }) })
            .await;
    }

    #[tokio::test]
    async fn opens_after_threshold_and_rejects_without_invoking() {
        let breaker = CircuitBreaker::new(settings(3, Duration::from_secs(60)));
        for _ in 0..3 {
            fail(&breaker).await;
        }
        assert_eq!(breaker.state().await, CircuitState::Open);

        let invoked = StdArc::new(AtomicU32::new(0));
        let counter = invoked.clone();
        let result = breaker
            .execute(|| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(1) }
            })
            .await;

        assert!(matches!(result, Err(ScanError::CircuitOpen)));
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn success_in_closed_resets_failure_count() {
        let breaker = CircuitBreaker::new(settings(3, Duration::from_secs(60)));
        fail(&breaker).await;
        fail(&breaker).await;
        breaker.execute(|| async { Ok(()) }).await.unwrap();
        fail(&breaker).await;
        fail(&breaker).await;
        // Two failures after the reset should not trip a threshold of three.
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn half_open_after_reset_then_closes_on_successes() {
        let breaker = CircuitBreaker::new(settings(1, Duration::from_millis(20)));
        fail(&breaker).await;
        assert_eq!(breaker.state().await, CircuitState::Open);

        tokio::time::sleep(Duration::from_millis(30)).await;

        breaker.execute(|| async { Ok(()) }).await.unwrap();
        assert_eq!(breaker.state().await, CircuitState::HalfOpen);
        breaker.execute(|| async { Ok(()) }).await.unwrap();
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn half_open_failure_reopens() {
        let breaker = CircuitBreaker::new(settings(1, Duration::from_millis(20)));
        fail(&breaker).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        fail(&breaker).await;
        assert_eq!(breaker.state().await, CircuitState::Open);
    }

    #[tokio::test]
    async fn slow_operation_times_out_and_counts_as_failure() {
        let breaker = CircuitBreaker::new(BreakerSettings {
            failure_threshold: 1,
            success_threshold: 2,
            reset_timeout: Duration::from_secs(60),
            request_timeout: Duration::from_millis(10),
        });

        let result = breaker
            .execute(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(ScanError::Timeout { .. })));
        assert_eq!(breaker.state().await, CircuitState::Open);
    }
}
