//! `patterns` subcommands exposing the signature table

use anyhow::Result;

use crate::cli::{Output, OutputFormat, PatternsCommands};
use crate::detector::SecretDetector;

pub fn execute(command: &PatternsCommands, format: OutputFormat, output: &Output) -> Result<()> {
    let detector = SecretDetector::new()?;

    match command {
        PatternsCommands::List => {
            let patterns = detector.patterns();
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&patterns)?),
                OutputFormat::Text => {
                    output.info(&format!("{} signatures", patterns.len()));
                    for info in patterns {
                        println!(
                            "{:<28} {:<16} {:<8}  {}",
                            info.name, info.category, info.severity, info.pattern
                        );
                    }
                }
            }
        }
        PatternsCommands::Types => {
            let types = detector.supported_types();
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&types)?),
                OutputFormat::Text => {
                    for name in types {
                        println!("{name}");
                    }
                }
            }
        }
        PatternsCommands::Categories => {
            let categories = detector.categories();
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&categories)?),
                OutputFormat::Text => {
                    for category in categories {
                        println!("{category}");
                    }
                }
            }
        }
    }
    Ok(())
}
