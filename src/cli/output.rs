//! Console output helpers
//!
//! Consistent styled messages for the CLI. Detections are always rendered
//! with masked values only; this module never sees raw secrets.

use console::style;

use crate::detector::Severity;
use crate::report::{ScanReport, SecurityAnalysisReport};

/// Output handler honoring verbose/quiet flags.
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("✔").green(), message);
        }
    }

    pub fn error(&self, message: &str) {
        // Errors are always shown, even in quiet mode.
        eprintln!("{} {}", style("✖").red(), message);
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("⚠").yellow(), message);
        }
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("ℹ").blue(), message);
        }
    }

    pub fn verbose(&self, message: &str) {
        if self.verbose {
            println!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Render a scan report as human-readable text.
    pub fn print_scan_report(&self, report: &ScanReport) {
        if self.quiet {
            return;
        }

        if let Some(repository) = &report.repository {
            println!(
                "{} {} ({})",
                style("Repository:").bold(),
                repository,
                report.branch.as_deref().unwrap_or("main")
            );
        }
        println!(
            "{} {} scanned, {} with secrets, {} secret(s) total",
            style("Files:").bold(),
            report.total_files_scanned,
            report.files_with_secrets,
            report.total_secrets_found
        );

        for result in &report.results {
            println!();
            println!(
                "{} {} [{}]",
                style("▶").cyan(),
                style(&result.file_path).bold(),
                severity_badge(result.severity)
            );
            for detection in &result.detections {
                println!(
                    "  {}:{} {} {} ({})",
                    detection.line,
                    detection.column,
                    severity_badge(detection.severity),
                    style(&detection.secret_type).bold(),
                    detection.value
                );
                if self.verbose {
                    println!("    {}", style(&detection.recommendation).dim());
                }
            }
        }

        if report.total_secrets_found == 0 {
            println!();
            self.success("No secrets detected");
        }
    }

    /// Render the analysis block appended to a scan report.
    pub fn print_analysis(&self, report: &SecurityAnalysisReport) {
        self.print_scan_report(&report.scan);
        if self.quiet {
            return;
        }

        let analysis = &report.analysis;
        println!();
        println!(
            "{} {}  {} {}",
            style("Risk score:").bold(),
            analysis.risk_score,
            style("Compliance:").bold(),
            analysis.compliance_status
        );
        println!(
            "  critical: {}  high: {}  medium: {}  low: {}",
            style(analysis.critical_issues).red(),
            style(analysis.high_issues).yellow(),
            analysis.medium_issues,
            analysis.low_issues
        );

        println!();
        println!("{}", style("Remediation steps:").bold());
        for (i, step) in analysis.remediation_steps.iter().enumerate() {
            println!("  {}. {}", i + 1, step);
        }

        println!();
        println!("{}", style("Recommendations:").bold());
        for item in &analysis.recommendations {
            println!("  {} {}", style("•").cyan(), item);
        }
    }
}

fn severity_badge(severity: Severity) -> console::StyledObject<&'static str> {
    match severity {
        Severity::Critical => style("CRITICAL").red().bold(),
        Severity::High => style("HIGH").red(),
        Severity::Medium => style("MEDIUM").yellow(),
        Severity::Low => style("LOW").dim(),
    }
}
