//! Risk and severity aggregation
//!
//! Pure functions that fold a list of per-file scan results into severity
//! counts, a bounded risk score, a compliance verdict, and remediation text.
//! Nothing here touches the network or mutates state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::detector::{Detection, Severity};
use crate::report::{FileResult, SecurityAnalysis, Summary, TypeFrequency};

/// Coarse compliance verdict derived from the risk score and severity counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    AtRisk,
    NonCompliant,
}

impl std::fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComplianceStatus::Compliant => write!(f, "compliant"),
            ComplianceStatus::AtRisk => write!(f, "at_risk"),
            ComplianceStatus::NonCompliant => write!(f, "non_compliant"),
        }
    }
}

/// Detection counts bucketed by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl SeverityCounts {
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.critical + self.high + self.medium + self.low
    }
}

/// Count detections across all files by severity.
pub fn count_severities(results: &[FileResult]) -> SeverityCounts {
    let mut counts = SeverityCounts::default();
    for result in results {
        for detection in &result.detections {
            counts.add(detection.severity);
        }
    }
    counts
}

/// Highest severity present, or `None` for an empty set.
pub fn calculate_severity(detections: &[Detection]) -> Option<Severity> {
    detections.iter().map(|d| d.severity).max()
}

/// Weighted risk score in `[0, 100]`: 10 per critical, 5 per high, 2 per
/// medium, 1 per low, capped.
pub fn risk_score(counts: &SeverityCounts) -> u32 {
    let raw = 10 * counts.critical + 5 * counts.high + 2 * counts.medium + counts.low;
    raw.min(100)
}

/// Compliance thresholds: any critical (or score >= 80) is non-compliant;
/// any high (or score >= 40) is at risk.
pub fn compliance_status(counts: &SeverityCounts, score: u32) -> ComplianceStatus {
    if counts.critical > 0 || score >= 80 {
        ComplianceStatus::NonCompliant
    } else if counts.high > 0 || score >= 40 {
        ComplianceStatus::AtRisk
    } else {
        ComplianceStatus::Compliant
    }
}

/// Ordered remediation list. Urgent items are prefixed when critical or high
/// findings exist; the standing hygiene items always follow.
pub fn remediation_steps(counts: &SeverityCounts) -> Vec<String> {
    let mut steps = Vec::new();

    if counts.critical > 0 {
        steps.push(
            "URGENT: Rotate all critical secrets immediately and audit provider logs for misuse"
                .to_string(),
        );
    }
    if counts.high > 0 {
        steps.push("Rotate high-severity credentials within 24 hours".to_string());
    }

    steps.extend(
        [
            "Remove hardcoded secrets from source and load them from the environment",
            "Adopt a secret manager (Vault, AWS Secrets Manager, or similar)",
            "Add pre-commit secret scanning to every contributor's workflow",
            "Purge leaked values from git history (git filter-repo or BFG)",
            "Enable secret scanning in CI so regressions fail the build",
        ]
        .map(String::from),
    );

    steps
}

/// Frequency of each detection type across all files, descending.
fn type_frequencies(results: &[FileResult]) -> Vec<TypeFrequency> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for result in results {
        for detection in &result.detections {
            *counts.entry(detection.secret_type.as_str()).or_default() += 1;
        }
    }

    let mut frequencies: Vec<TypeFrequency> = counts
        .into_iter()
        .map(|(secret_type, count)| TypeFrequency {
            secret_type: secret_type.to_string(),
            count,
        })
        .collect();
    // Descending by count, name as tiebreak so output is deterministic.
    frequencies.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.secret_type.cmp(&b.secret_type))
    });
    frequencies
}

/// Targeted recommendations: the three most frequent detection types, the
/// standing advice, plus escalation items for high scores.
pub fn recommendations(results: &[FileResult], score: u32) -> Vec<String> {
    let mut items = Vec::new();

    for freq in type_frequencies(results).into_iter().take(3) {
        items.push(format!(
            "Address {} {} finding(s) first; they are the most frequent in this scan",
            freq.count, freq.secret_type
        ));
    }

    items.push("Prefer environment variables or a secret manager over literals".to_string());
    items.push("Keep .env files and credential stores out of version control".to_string());

    if score >= 70 {
        items.push("Conduct a full credential rotation across every affected service".to_string());
        items.push("Treat this repository as compromised and run an incident review".to_string());
    }

    items
}

/// Summary block for the scan report.
pub fn generate_summary(total_files: usize, results: &[FileResult]) -> Summary {
    let counts = count_severities(results);

    // All four severities are always present, even at zero.
    let mut breakdown = std::collections::BTreeMap::new();
    breakdown.insert("critical".to_string(), counts.critical);
    breakdown.insert("high".to_string(), counts.high);
    breakdown.insert("medium".to_string(), counts.medium);
    breakdown.insert("low".to_string(), counts.low);

    Summary {
        total_files,
        files_with_secrets: results.len(),
        total_secrets: counts.total() as usize,
        severity_breakdown: breakdown,
        top_detection_types: type_frequencies(results).into_iter().take(10).collect(),
    }
}

/// Full security analysis over a result set.
pub fn analyze(results: &[FileResult]) -> SecurityAnalysis {
    let counts = count_severities(results);
    let score = risk_score(&counts);

    SecurityAnalysis {
        risk_score: score,
        compliance_status: compliance_status(&counts, score),
        critical_issues: counts.critical,
        high_issues: counts.high,
        medium_issues: counts.medium,
        low_issues: counts.low,
        remediation_steps: remediation_steps(&counts),
        recommendations: recommendations(results, score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::Detection;

    fn detection(secret_type: &str, severity: Severity) -> Detection {
        Detection {
            secret_type: secret_type.to_string(),
            category: "test".to_string(),
            severity,
            value: "ab****".to_string(),
            line: 1,
            column: 1,
            context: String::new(),
            pattern: String::new(),
            recommendation: String::new(),
        }
    }

    fn file(path: &str, detections: Vec<Detection>) -> FileResult {
        let severity = calculate_severity(&detections).expect("non-empty");
        FileResult {
            file_path: path.to_string(),
            detections,
            severity,
        }
    }

    #[test]
    fn severity_is_max_and_none_when_empty() {
        assert_eq!(calculate_severity(&[]), None);
        let ds = vec![
            detection("a", Severity::Low),
            detection("b", Severity::High),
            detection("c", Severity::Medium),
        ];
        assert_eq!(calculate_severity(&ds), Some(Severity::High));
    }

    #[test]
    fn risk_score_weights_and_cap() {
        let counts = SeverityCounts {
            critical: 1,
            high: 1,
            medium: 1,
            low: 1,
        };
        assert_eq!(risk_score(&counts), 18);

        let many = SeverityCounts {
            critical: 50,
            ..Default::default()
        };
        assert_eq!(risk_score(&many), 100);
        assert_eq!(risk_score(&SeverityCounts::default()), 0);
    }

    #[test]
    fn risk_score_is_monotonic() {
        let mut counts = SeverityCounts::default();
        let mut previous = risk_score(&counts);
        for severity in [
            Severity::Low,
            Severity::Medium,
            Severity::Critical,
            Severity::High,
            Severity::Critical,
        ] {
            counts.add(severity);
            let next = risk_score(&counts);
            assert!(next >= previous);
            assert!(next <= 100);
            previous = next;
        }
    }

    #[test]
    fn one_critical_is_always_non_compliant() {
        let counts = SeverityCounts {
            critical: 1,
            ..Default::default()
        };
        let score = risk_score(&counts);
        assert_eq!(
            compliance_status(&counts, score),
            ComplianceStatus::NonCompliant
        );
    }

    #[test]
    fn compliance_thresholds() {
        let clean = SeverityCounts::default();
        assert_eq!(compliance_status(&clean, 0), ComplianceStatus::Compliant);

        let one_high = SeverityCounts {
            high: 1,
            ..Default::default()
        };
        assert_eq!(
            compliance_status(&one_high, risk_score(&one_high)),
            ComplianceStatus::AtRisk
        );

        // Score-driven thresholds without critical/high findings.
        let many_medium = SeverityCounts {
            medium: 20,
            ..Default::default()
        };
        assert_eq!(
            compliance_status(&many_medium, risk_score(&many_medium)),
            ComplianceStatus::AtRisk
        );
        let flood = SeverityCounts {
            medium: 40,
            ..Default::default()
        };
        assert_eq!(
            compliance_status(&flood, risk_score(&flood)),
            ComplianceStatus::NonCompliant
        );
    }

    #[test]
    fn remediation_always_has_standing_items() {
        let steps = remediation_steps(&SeverityCounts::default());
        assert!(steps.len() >= 5);
        assert!(!steps[0].starts_with("URGENT"));

        let urgent = remediation_steps(&SeverityCounts {
            critical: 2,
            high: 1,
            ..Default::default()
        });
        assert!(urgent[0].starts_with("URGENT"));
        assert!(urgent[1].contains("24 hours"));
        assert_eq!(urgent.len(), steps.len() + 2);
    }

    #[test]
    fn recommendations_name_top_three_types() {
        let results = vec![
            file(
                "a.js",
                vec![
                    detection("github_token", Severity::Critical),
                    detection("github_token", Severity::Critical),
                    detection("github_token", Severity::Critical),
                ],
            ),
            file(
                "b.js",
                vec![
                    detection("stripe_api_key", Severity::Critical),
                    detection("stripe_api_key", Severity::Critical),
                    detection("jwt_token", Severity::Medium),
                    detection("slack_token", Severity::High),
                ],
            ),
        ];

        let items = recommendations(&results, 10);
        assert!(items[0].contains("github_token"));
        assert!(items[1].contains("stripe_api_key"));
        // jwt_token and slack_token tie at 1; name order breaks the tie.
        assert!(items[2].contains("jwt_token"));
    }

    #[test]
    fn high_score_appends_two_escalation_items() {
        let base = recommendations(&[], 69).len();
        assert_eq!(recommendations(&[], 70).len(), base + 2);
    }

    #[test]
    fn summary_includes_all_severity_keys() {
        let results = vec![file("a.py", vec![detection("gcp_api_key", Severity::High)])];
        let summary = generate_summary(12, &results);

        assert_eq!(summary.total_files, 12);
        assert_eq!(summary.files_with_secrets, 1);
        assert_eq!(summary.total_secrets, 1);
        assert_eq!(summary.severity_breakdown.len(), 4);
        assert_eq!(summary.severity_breakdown["high"], 1);
        assert_eq!(summary.severity_breakdown["critical"], 0);
        assert_eq!(summary.top_detection_types.len(), 1);
    }
}
