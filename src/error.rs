//! Error taxonomy for scanning operations
//!
//! Errors are split into operational failures (rate limits, timeouts,
//! transient remote faults) and everything else. Only operational errors are
//! eligible for retry; the distinction never changes the shape a client sees.

use serde::Serialize;
use thiserror::Error;

/// Errors produced by the scan pipeline.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Malformed or missing input. Never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// The remote repository, branch, or path could not be accessed (404 or
    /// permission denied). Never retried.
    #[error("repository access error: {resource}: {message}")]
    RepositoryAccess { resource: String, message: String },

    /// Local bucket exhaustion or a remote 429.
    #[error("rate limit exceeded: {0}")]
    RateLimit(String),

    /// A per-call or whole-scan deadline expired.
    #[error("operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Catch-all remote API failure. Retried when the status class is
    /// transient (5xx) or the failure was network-level.
    #[error("remote API error{}: {message}", status.map(|s| format!(" ({s})")).unwrap_or_default())]
    RemoteApi {
        status: Option<u16>,
        message: String,
    },

    /// The circuit breaker rejected the call without invoking it.
    #[error("circuit breaker is open, remote calls suspended")]
    CircuitOpen,

    /// Configuration could not be loaded or extracted.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ScanError {
    /// Whether the retry layer may attempt this operation again.
    ///
    /// Only operational errors qualify. The circuit breaker is the retry
    /// boundary for `CircuitOpen`: retrying past it would defeat the breaker.
    pub fn is_retryable(&self) -> bool {
        match self {
            ScanError::RateLimit(_) => true,
            ScanError::Timeout { .. } => true,
            ScanError::RemoteApi { status, .. } => match status {
                Some(code) => *code == 429 || *code >= 500,
                // No status means the failure was network-level.
                None => true,
            },
            ScanError::Validation(_)
            | ScanError::RepositoryAccess { .. }
            | ScanError::CircuitOpen
            | ScanError::Config(_) => false,
        }
    }

    /// Short stable code for the outward error report.
    pub fn code(&self) -> &'static str {
        match self {
            ScanError::Validation(_) => "VALIDATION_ERROR",
            ScanError::RepositoryAccess { .. } => "REPOSITORY_ACCESS_ERROR",
            ScanError::RateLimit(_) => "RATE_LIMIT_ERROR",
            ScanError::Timeout { .. } => "TIMEOUT_ERROR",
            ScanError::RemoteApi { .. } => "REMOTE_API_ERROR",
            ScanError::CircuitOpen => "CIRCUIT_OPEN",
            ScanError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Convert into the sanitized structure returned to clients.
    pub fn to_report(&self, context: Option<String>) -> ErrorReport {
        ErrorReport {
            kind: match self {
                ScanError::Validation(_) => "validation",
                ScanError::RepositoryAccess { .. } => "repository_access",
                ScanError::RateLimit(_) => "rate_limit",
                ScanError::Timeout { .. } => "timeout",
                ScanError::RemoteApi { .. } => "remote_api",
                ScanError::CircuitOpen => "circuit_open",
                ScanError::Config(_) => "config",
            }
            .to_string(),
            code: self.code().to_string(),
            message: self.to_string(),
            context,
        }
    }
}

/// Sanitized error shape for outward responses.
///
/// Carries no raw secret material and no backtraces; `message` is the display
/// form of the error, which never embeds matched values.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub kind: String,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operational_errors_are_retryable() {
        assert!(ScanError::RateLimit("bucket empty".into()).is_retryable());
        assert!(ScanError::Timeout { seconds: 30 }.is_retryable());
        assert!(
            ScanError::RemoteApi {
                status: Some(503),
                message: "unavailable".into()
            }
            .is_retryable()
        );
        assert!(
            ScanError::RemoteApi {
                status: None,
                message: "connection reset".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn programming_errors_are_not_retryable() {
        assert!(!ScanError::Validation("missing owner".into()).is_retryable());
        assert!(
            !ScanError::RepositoryAccess {
                resource: "acme/app".into(),
                message: "not found".into()
            }
            .is_retryable()
        );
        assert!(!ScanError::CircuitOpen.is_retryable());
        assert!(
            !ScanError::RemoteApi {
                status: Some(400),
                message: "bad request".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn report_carries_code_and_kind() {
        let report = ScanError::Timeout { seconds: 300 }.to_report(Some("acme/app".into()));
        assert_eq!(report.code, "TIMEOUT_ERROR");
        assert_eq!(report.kind, "timeout");
        assert_eq!(report.context.as_deref(), Some("acme/app"));
    }
}
