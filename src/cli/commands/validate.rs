//! `validate` command: format-only advisory for a candidate secret

use anyhow::Result;

use crate::cli::{Output, OutputFormat};
use crate::detector::SecretDetector;

pub fn execute(
    secret_type: &str,
    value: &str,
    format: OutputFormat,
    output: &Output,
) -> Result<()> {
    let detector = SecretDetector::new()?;
    let advisory = detector.validate_secret(secret_type, value);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&advisory)?),
        OutputFormat::Text => {
            if advisory.valid {
                output.warning(&format!(
                    "value matches the {secret_type} format: {}",
                    advisory.message
                ));
                if let Some(recommendation) = &advisory.recommendation {
                    output.info(recommendation);
                }
            } else {
                output.info(&advisory.message);
            }
        }
    }
    Ok(())
}
