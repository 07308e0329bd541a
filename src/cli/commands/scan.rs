//! `scan repo` and `scan content` commands

use std::io::Read;

use anyhow::{Context, Result, bail};

use crate::cli::{Output, OutputFormat, ScanCommands};
use crate::config::ScanConfig;
use crate::report::RepoLocator;
use crate::service::{ScanService, analyze_report};

pub async fn execute(
    command: &ScanCommands,
    config_path: Option<&str>,
    format: OutputFormat,
    output: &Output,
) -> Result<()> {
    let config = ScanConfig::load(config_path)?;
    let service = ScanService::new(config)?;

    match command {
        ScanCommands::Repo {
            owner,
            repo,
            branch,
            path,
            analyze,
        } => {
            let locator = RepoLocator {
                owner: owner.clone(),
                repo: repo.clone(),
                branch: branch.clone(),
                path: path.clone(),
            };
            output.verbose(&format!("scanning {} ({})", locator.slug(), locator.branch));

            let report = match service.scan_repository(&locator).await {
                Ok(report) => report,
                Err(error) => {
                    render_error(&error, Some(locator.slug()), format, output);
                    bail!("scan failed");
                }
            };
            let secrets_found = report.total_secrets_found;

            if *analyze {
                let full = analyze_report(report);
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&full)?),
                    OutputFormat::Text => output.print_analysis(&full),
                }
            } else {
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                    OutputFormat::Text => output.print_scan_report(&report),
                }
            }

            if secrets_found > 0 {
                bail!("{secrets_found} secret(s) detected");
            }
            Ok(())
        }
        ScanCommands::Content {
            input,
            path_hint,
            analyze,
        } => {
            let content = read_input(input)?;
            let report = service.scan_content(&content, path_hint.as_deref());
            let secrets_found = report.total_secrets_found;

            if *analyze {
                let full = analyze_report(report);
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&full)?),
                    OutputFormat::Text => output.print_analysis(&full),
                }
            } else {
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                    OutputFormat::Text => output.print_scan_report(&report),
                }
            }

            if secrets_found > 0 {
                bail!("{secrets_found} secret(s) detected");
            }
            Ok(())
        }
    }
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("failed to read file: {input}"))
    }
}

fn render_error(
    error: &crate::error::ScanError,
    context: Option<String>,
    format: OutputFormat,
    output: &Output,
) {
    match format {
        OutputFormat::Json => {
            let report = error.to_report(context);
            if let Ok(json) = serde_json::to_string_pretty(&report) {
                eprintln!("{json}");
            }
        }
        OutputFormat::Text => output.error(&error.to_string()),
    }
}
