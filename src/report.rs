//! Outward report types
//!
//! Serde shapes for scan requests and the reports returned to callers. These
//! carry masked values only; nothing in this module ever holds a raw secret.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analyzer::ComplianceStatus;
use crate::detector::{Detection, Severity};
use crate::error::ScanError;

/// Locator for a remote repository scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoLocator {
    pub owner: String,
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Restricts the scan to a single entry when set.
    #[serde(default)]
    pub path: Option<String>,
}

fn default_branch() -> String {
    "main".to_string()
}

impl RepoLocator {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: default_branch(),
            path: None,
        }
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        if self.owner.trim().is_empty() {
            return Err(ScanError::Validation("owner must not be empty".into()));
        }
        if self.repo.trim().is_empty() {
            return Err(ScanError::Validation("repo must not be empty".into()));
        }
        let ok = |s: &str| {
            s.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        };
        if !ok(&self.owner) || !ok(&self.repo) {
            return Err(ScanError::Validation(
                "owner and repo may only contain alphanumerics, '-', '_' and '.'".into(),
            ));
        }
        Ok(())
    }

    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Detections for one scanned file. Only files with at least one detection
/// appear in a report, so `severity` is always a real level.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub file_path: String,
    pub detections: Vec<Detection>,
    pub severity: Severity,
}

/// One detection type and how often it fired.
#[derive(Debug, Clone, Serialize)]
pub struct TypeFrequency {
    #[serde(rename = "type")]
    pub secret_type: String,
    pub count: u32,
}

/// Aggregate block appended to every scan report.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total_files: usize,
    pub files_with_secrets: usize,
    pub total_secrets: usize,
    /// Always contains all four severity keys, zero or not.
    pub severity_breakdown: BTreeMap<String, u32>,
    /// Top ten detection types by frequency.
    pub top_detection_types: Vec<TypeFrequency>,
}

/// Report for one scan run, inline or remote.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub scan_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub total_files_scanned: usize,
    pub files_with_secrets: usize,
    pub total_secrets_found: usize,
    pub results: Vec<FileResult>,
    pub summary: Summary,
}

/// Risk aggregates layered on top of a scan report.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityAnalysis {
    pub risk_score: u32,
    pub compliance_status: ComplianceStatus,
    pub critical_issues: u32,
    pub high_issues: u32,
    pub medium_issues: u32,
    pub low_issues: u32,
    pub remediation_steps: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Scan report plus the security analysis block.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityAnalysisReport {
    #[serde(flatten)]
    pub scan: ScanReport,
    #[serde(flatten)]
    pub analysis: SecurityAnalysis,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_defaults_to_main() {
        let locator = RepoLocator::new("acme", "app");
        assert_eq!(locator.branch, "main");
        assert_eq!(locator.slug(), "acme/app");
        assert!(locator.validate().is_ok());
    }

    #[test]
    fn locator_rejects_bad_input() {
        assert!(RepoLocator::new("", "app").validate().is_err());
        assert!(RepoLocator::new("acme", "").validate().is_err());
        assert!(RepoLocator::new("acme", "app/../etc").validate().is_err());
    }

    #[test]
    fn locator_deserializes_with_default_branch() {
        let locator: RepoLocator = serde_json::from_str(r#"{"owner":"a","repo":"b"}"#).unwrap();
        assert_eq!(locator.branch, "main");
        assert!(locator.path.is_none());
    }
}
