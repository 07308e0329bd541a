//! Resilience primitives for remote calls
//!
//! Every request to the remote API flows through the same chain: a rate-limit
//! token is acquired first, the circuit breaker gates the call, and the
//! breaker's inner operation is the retry-wrapped request itself.

pub mod circuit_breaker;
pub mod rate_limiter;
pub mod retry;

pub use circuit_breaker::{BreakerSettings, CircuitBreaker, CircuitState};
pub use rate_limiter::RateLimiter;
pub use retry::{RetryPolicy, retry_with_backoff};
