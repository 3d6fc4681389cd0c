//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Feedbackq - ask questions about customer-feedback data
///
/// Loads cleaned feedback records, then answers a question about them with a
/// chart, a local LLM, or a deterministic report when no LLM is reachable.
///
/// Examples:
///   feedbackq --records feedback.json --question "What are customers unhappy about?"
///   feedbackq --records feedback.json --question "chart csat by brand" --format json
///   feedbackq --records feedback.json --question "Summarize CB2" --no-delegates
///   feedbackq --records feedback.json --question "Top issues?" --dry-run
///   feedbackq --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// JSON file with the cleaned feedback records
    ///
    /// An array of objects with date, brand, csat and feedback fields
    /// (ingestion column names such as "Digital CSAT" are accepted too).
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub records: Option<PathBuf>,

    /// Question to ask about the records
    #[arg(short = 'Q', long, value_name = "TEXT", required_unless_present = "init_config")]
    pub question: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .feedbackq.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Model requested from every delegate endpoint
    #[arg(short, long, env = "FEEDBACKQ_MODEL")]
    pub model: Option<String>,

    /// Base URL of the completion (Ollama) endpoint
    ///
    /// The full route (e.g. http://localhost:11434/api/generate) works too.
    #[arg(long, value_name = "URL", env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Base URL of the OpenAI-compatible chat endpoint
    ///
    /// The full route (e.g. http://localhost:8000/v1/chat/completions) works too.
    #[arg(long, value_name = "URL", env = "TRANSFORMERS_URL")]
    pub chat_url: Option<String>,

    /// Per-endpoint request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Skip the LLM endpoints and answer from the local report
    #[arg(long)]
    pub no_delegates: bool,

    /// Show what would be sent to the LLM without calling it
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .feedbackq.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for answers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text (default)
    #[default]
    Text,
    /// JSON, in the shape chat front ends consume
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        for url in [&self.ollama_url, &self.chat_url].into_iter().flatten() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(format!(
                    "Endpoint URL must start with 'http://' or 'https://': {}",
                    url
                ));
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref question) = self.question {
            if question.trim().is_empty() {
                return Err("Question must not be blank".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref records) = self.records {
            if !records.is_file() {
                return Err(format!("Records file does not exist: {}", records.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_args() -> Args {
        Args {
            records: None,
            question: Some("What are the top issues?".to_string()),
            config: None,
            format: None,
            model: None,
            ollama_url: None,
            chat_url: None,
            timeout: None,
            no_delegates: false,
            dry_run: false,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_ok() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.chat_url = Some("localhost:8000".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_records_file() {
        let mut args = make_args();
        args.records = Some(PathBuf::from("/no/such/feedback.json"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_blank_question() {
        let mut args = make_args();
        args.question = Some("   ".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "feedbackq",
            "--records",
            "data.json",
            "-Q",
            "chart csat by brand",
            "--format",
            "json",
            "--no-delegates",
        ])
        .unwrap();

        assert_eq!(args.records, Some(PathBuf::from("data.json")));
        assert_eq!(args.question.as_deref(), Some("chart csat by brand"));
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert!(args.no_delegates);
    }

    #[test]
    fn test_init_config_needs_nothing_else() {
        let args = Args::try_parse_from(["feedbackq", "--init-config"]).unwrap();
        assert!(args.init_config);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
