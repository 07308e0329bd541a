//! Configuration management for secretscan
//!
//! Configuration is merged from three layers: the embedded defaults, an
//! optional `secretscan.toml` in the working directory (or an explicit file),
//! and `SECRETSCAN_`-prefixed environment variables. Environment variables
//! always win.

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

// Embed the default config at compile time so the binary works with no
// config file present.
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

/// Fully resolved configuration consumed by the scan pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    pub github: GithubConfig,
    pub limits: LimitsConfig,
    pub retry: RetryConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub scanner: ScannerConfig,
}

/// GitHub API access settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Requests allowed per hour; feeds the token bucket refill rate.
    pub rate_per_hour: u32,
    /// Token bucket capacity.
    pub burst: u32,
    /// How long `wait_for_token` polls before giving up.
    pub token_wait_secs: u64,
    /// Optional bearer token. Also read from SECRETSCAN_GITHUB_TOKEN.
    #[serde(default)]
    pub token: Option<String>,
}

/// Size and time bounds for a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Decoded content larger than this is discarded whole.
    pub max_file_size: usize,
    /// Content-bearing files admitted per repository scan.
    pub max_files_per_scan: usize,
    /// Whole-scan wall clock budget.
    pub scan_timeout_secs: u64,
}

/// Exponential backoff retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

/// Circuit breaker thresholds and timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,
    /// Consecutive half-open successes before the circuit closes.
    pub success_threshold: u32,
    /// Seconds the circuit stays open before probing.
    pub reset_timeout_secs: u64,
    /// Per-call timeout imposed by the breaker.
    pub request_timeout_secs: u64,
}

/// Detector and traversal tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Extra glob patterns excluded from remote traversal.
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

impl ScanConfig {
    /// Load configuration from defaults, an optional file, and environment.
    pub fn load(custom_config: Option<&str>) -> Result<Self, ScanError> {
        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));

        if let Some(path) = custom_config {
            figment = figment.merge(Toml::file(path));
        } else {
            figment = figment.merge(Toml::file("secretscan.toml"));
        }

        // Environment variables always have highest priority. The nested
        // separator lets SECRETSCAN_GITHUB__TOKEN reach github.token.
        figment = figment.merge(Env::prefixed("SECRETSCAN_").split("__"));

        let mut config: ScanConfig = figment
            .extract()
            .map_err(|e| ScanError::Config(e.to_string()))?;

        if config.github.token.is_none() {
            config.github.token = std::env::var("SECRETSCAN_GITHUB_TOKEN")
                .ok()
                .filter(|t| !t.is_empty());
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ScanError> {
        if self.github.burst == 0 {
            return Err(ScanError::Config("github.burst must be positive".into()));
        }
        if self.github.rate_per_hour == 0 {
            return Err(ScanError::Config(
                "github.rate_per_hour must be positive".into(),
            ));
        }
        if self.limits.max_files_per_scan == 0 {
            return Err(ScanError::Config(
                "limits.max_files_per_scan must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.circuit_breaker.request_timeout_secs)
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.limits.scan_timeout_secs)
    }

    pub fn token_wait(&self) -> Duration {
        Duration::from_secs(self.github.token_wait_secs)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        // The embedded defaults are the canonical default values.
        Figment::new()
            .merge(Toml::string(DEFAULT_CONFIG))
            .extract()
            .expect("embedded default config must parse")
    }
}
