//! Command-line interface
//!
//! Clap-based command surface over the scan service. Commands are thin: they
//! parse arguments, load configuration, call into the library, and render.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

mod commands;
mod output;

pub use output::Output;

/// secretscan - severity-scored secret detection for repositories and text
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable quiet output (minimal)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a remote repository or inline content
    #[command(subcommand)]
    Scan(ScanCommands),
    /// Inspect the signature table
    #[command(subcommand)]
    Patterns(PatternsCommands),
    /// Check whether a value matches a known secret format
    Validate {
        /// Detection type, e.g. aws_access_key_id
        secret_type: String,
        /// Candidate value to check
        value: String,
    },
}

#[derive(Subcommand)]
pub enum ScanCommands {
    /// Scan a remote repository tree
    Repo {
        /// Repository owner (user or organization)
        owner: String,
        /// Repository name
        repo: String,
        /// Branch or ref to scan
        #[arg(short, long, default_value = "main")]
        branch: String,
        /// Restrict the scan to a single path
        #[arg(short, long)]
        path: Option<String>,
        /// Append the risk/compliance analysis to the report
        #[arg(long)]
        analyze: bool,
    },
    /// Scan a local file or stdin ("-")
    Content {
        /// File to scan, or "-" for stdin
        input: String,
        /// Path label used in the report
        #[arg(long)]
        path_hint: Option<String>,
        /// Append the risk/compliance analysis to the report
        #[arg(long)]
        analyze: bool,
    },
}

#[derive(Subcommand)]
pub enum PatternsCommands {
    /// List every signature with its pattern source
    List,
    /// List supported detection type names
    Types,
    /// List signature categories
    Categories,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let output = Output::new(self.verbose, self.quiet);
        match self.command {
            Commands::Scan(ref scan) => {
                commands::scan::execute(scan, self.config.as_deref(), self.format, &output).await
            }
            Commands::Patterns(ref patterns) => {
                commands::patterns::execute(patterns, self.format, &output)
            }
            Commands::Validate {
                ref secret_type,
                ref value,
            } => commands::validate::execute(secret_type, value, self.format, &output),
        }
    }
}
