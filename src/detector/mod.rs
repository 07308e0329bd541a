//! Secret detection engine
//!
//! The detector runs every signature in the built-in table against each line
//! of input, screens out placeholder values, and emits detections whose
//! matched value is masked before it ever leaves this module.

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub mod signatures;

#[cfg(test)]
mod tests;

pub use signatures::{SecretSignature, Validator, builtin_signatures};

/// Severity of a detected secret, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// One confirmed match of a signature against scanned text.
///
/// `value` holds the masked form only; the raw secret is discarded during
/// construction and never retained.
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    #[serde(rename = "type")]
    pub secret_type: String,
    pub category: String,
    pub severity: Severity,
    /// Masked value, never the raw secret.
    pub value: String,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column of the matched value.
    pub column: usize,
    /// Up to two lines either side of the match, joined with newlines.
    pub context: String,
    /// Regex source that produced the match, kept for audit.
    pub pattern: String,
    pub recommendation: String,
}

/// Advisory returned by [`SecretDetector::validate_secret`].
///
/// This is a format-only verdict: no request is ever made to the issuing
/// service.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationAdvisory {
    pub secret_type: String,
    pub valid: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

/// Name and pattern source for one table entry, as exposed to callers.
#[derive(Debug, Clone, Serialize)]
pub struct PatternInfo {
    pub name: String,
    pub category: String,
    pub severity: Severity,
    pub pattern: String,
}

/// Lines scanned per call, hard cap.
const MAX_LINES: usize = 100_000;
/// Matched values longer than this are never real secrets.
const MAX_VALUE_LEN: usize = 10_000;
/// Default truncation bound for scanned content.
const DEFAULT_MAX_CONTENT: usize = 1_048_576;

/// Values that mark a match as a placeholder rather than a live secret.
const PLACEHOLDER_WORDS: &[&str] = &[
    "example",
    "test",
    "dummy",
    "sample",
    "demo",
    "placeholder",
    "changeme",
    "your_key_here",
    "xxx",
    "fake",
    "mock",
    "stub",
    "password",
    "secret",
    "key",
    "token",
    "00000000",
    "12345678",
    "11111111",
];

/// Pattern-based secret detector over an immutable signature table.
pub struct SecretDetector {
    signatures: Vec<SecretSignature>,
    max_content_bytes: usize,
}

impl SecretDetector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            signatures: builtin_signatures()?,
            max_content_bytes: DEFAULT_MAX_CONTENT,
        })
    }

    pub fn with_max_content(max_content_bytes: usize) -> Result<Self> {
        Ok(Self {
            signatures: builtin_signatures()?,
            max_content_bytes,
        })
    }

    /// Scan `content` and return detections in deterministic order: line,
    /// then signature-table order, then match order within the line.
    pub fn scan(&self, content: &str, path: &str) -> Vec<Detection> {
        let content = truncate_at_boundary(content, self.max_content_bytes);
        let lines: Vec<&str> = content.lines().collect();
        let mut detections = Vec::new();

        for (idx, line) in lines.iter().enumerate().take(MAX_LINES) {
            let trimmed = line.trim_start();
            // Performance filter only: blank lines and single-line comments
            // carry the bulk of most files and almost never live secrets.
            if trimmed.is_empty() || trimmed.starts_with("//") || trimmed.starts_with('#') {
                continue;
            }

            // Spans already claimed on this line. A generic assignment
            // pattern and a service-specific one often capture the same
            // value; table order decides which detection type wins.
            let mut claimed: Vec<(usize, usize)> = Vec::new();

            for signature in &self.signatures {
                for caps in signature.regex.captures_iter(line) {
                    let group = caps
                        .get(1)
                        .unwrap_or_else(|| caps.get(0).expect("group 0 always present"));
                    let value = group.as_str();
                    let span = (group.start(), group.end());

                    if claimed.contains(&span) {
                        continue;
                    }
                    if !self.confirm(signature, value) {
                        continue;
                    }
                    claimed.push(span);

                    detections.push(Detection {
                        secret_type: signature.name.to_string(),
                        category: signature.category.to_string(),
                        severity: signature.severity,
                        value: mask_value(value),
                        line: idx + 1,
                        column: group.start() + 1,
                        context: context_window(&lines, idx),
                        pattern: signature.regex.as_str().to_string(),
                        recommendation: signature.recommendation.to_string(),
                    });
                }
            }
        }

        if !detections.is_empty() {
            tracing::debug!(path, count = detections.len(), "detections in file");
        }
        detections
    }

    /// Decide whether a raw match is a real secret.
    ///
    /// A custom validator is authoritative and replaces the generic screen.
    fn confirm(&self, signature: &SecretSignature, value: &str) -> bool {
        if signature.validator.is_custom() {
            return signature.validator.confirm(value);
        }
        generic_screen(value, signature.min_length)
    }

    /// Names of every detection type in the table.
    pub fn supported_types(&self) -> Vec<&'static str> {
        self.signatures.iter().map(|s| s.name).collect()
    }

    /// Distinct categories, in table order.
    pub fn categories(&self) -> Vec<&'static str> {
        let mut seen = Vec::new();
        for signature in &self.signatures {
            if !seen.contains(&signature.category) {
                seen.push(signature.category);
            }
        }
        seen
    }

    /// Pattern sources for audit and tooling.
    pub fn patterns(&self) -> Vec<PatternInfo> {
        self.signatures
            .iter()
            .map(|s| PatternInfo {
                name: s.name.to_string(),
                category: s.category.to_string(),
                severity: s.severity,
                pattern: s.regex.as_str().to_string(),
            })
            .collect()
    }

    /// Format-only advisory for a candidate value of a named type.
    pub fn validate_secret(&self, secret_type: &str, value: &str) -> ValidationAdvisory {
        let Some(signature) = self.signatures.iter().find(|s| s.name == secret_type) else {
            return ValidationAdvisory {
                secret_type: secret_type.to_string(),
                valid: false,
                message: format!("unknown secret type: {secret_type}"),
                recommendation: None,
            };
        };

        let format_matches = signature.regex.is_match(value) && self.confirm(signature, value);
        ValidationAdvisory {
            secret_type: secret_type.to_string(),
            valid: format_matches,
            message: if format_matches {
                "value matches the signature format; live validation against the issuing \
                 service is not performed"
                    .to_string()
            } else {
                "value does not match the signature format".to_string()
            },
            recommendation: format_matches.then(|| signature.recommendation.to_string()),
        }
    }
}

/// Generic false-positive screen for signatures without a custom validator.
fn generic_screen(value: &str, min_length: Option<usize>) -> bool {
    let normalized = value.trim().to_lowercase();

    if normalized.len() > MAX_VALUE_LEN {
        return false;
    }
    if let Some(min) = min_length {
        if normalized.len() < min {
            return false;
        }
    }
    if PLACEHOLDER_WORDS.iter().any(|w| normalized.contains(w)) {
        return false;
    }
    if is_repeated_char(&normalized) {
        return false;
    }
    true
}

/// True when the value is one character repeated (`aaaa`, `....`).
fn is_repeated_char(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => {
            let mut rest = chars.peekable();
            rest.peek().is_some() && rest.all(|c| c == first)
        }
        None => false,
    }
}

/// Adaptive masking: enough prefix/suffix survives to identify the secret to
/// its owner, never enough to reconstruct it.
fn mask_value(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let n = chars.len();
    let take = |range: std::ops::Range<usize>| chars[range].iter().collect::<String>();

    if n <= 4 {
        "****".to_string()
    } else if n <= 8 {
        format!("{}****", take(0..2))
    } else if n <= 32 {
        format!("{}****{}", take(0..4), take(n - 4..n))
    } else {
        format!("{}****{}", take(0..6), take(n - 6..n))
    }
}

/// The ±2-line window around a match, joined with newlines.
fn context_window(lines: &[&str], idx: usize) -> String {
    let start = idx.saturating_sub(2);
    let end = (idx + 2).min(lines.len().saturating_sub(1));
    lines[start..=end].join("\n")
}

/// Truncate to at most `max` bytes without splitting a UTF-8 sequence.
fn truncate_at_boundary(content: &str, max: usize) -> &str {
    if content.len() <= max {
        return content;
    }
    let mut cut = max;
    while cut > 0 && !content.is_char_boundary(cut) {
        cut -= 1;
    }
    &content[..cut]
}
