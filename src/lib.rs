//! # secretscan - severity-scored secret detection
//!
//! Scans repository trees fetched from the GitHub contents API, or inline
//! content, for hard-coded credentials and produces a risk-assessed report
//! with remediation guidance.
//!
//! ## Features
//!
//! - **Signature-based detection**: 40+ secret patterns with false-positive
//!   screening and adaptive masking; raw values never leave the detector
//! - **Resilient remote fetch**: token-bucket rate limiting, exponential
//!   backoff retry, and a circuit breaker around every API call
//! - **Risk scoring**: severity-weighted 0-100 score with a compliance
//!   verdict and ordered remediation steps
//!
//! ## Quick Start
//!
//! ```bash
//! # Scan a repository
//! secretscan scan repo acme widget --branch main
//!
//! # Scan stdin
//! cat config.env | secretscan scan content -
//! ```

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod detector;
pub mod error;
pub mod remote;
pub mod report;
pub mod resilience;
pub mod service;

pub use cli::{Cli, Output};
pub use config::ScanConfig;
pub use error::ScanError;

/// Result type alias for secretscan operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
