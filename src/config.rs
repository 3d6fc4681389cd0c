//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.feedbackq.toml` files.

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".feedbackq.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Aggregation and report settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Delegate endpoints, in the order they are tried.
    #[serde(default = "default_delegates")]
    pub delegates: Vec<DelegateConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            analysis: AnalysisConfig::default(),
            delegates: default_delegates(),
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Output format for answers.
    #[serde(default)]
    pub format: OutputFormat,
}

/// How much of the aggregate makes it into prompts and reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Free words listed in the local report.
    #[serde(default = "default_top_n")]
    pub top_words: usize,

    /// Issue keywords listed in prompts and the local report.
    #[serde(default = "default_top_n")]
    pub top_issues: usize,

    /// Records always sampled from each end of the dataset.
    #[serde(default = "default_sample_edge")]
    pub sample_edge: usize,

    /// Approximate number of evenly spaced sample records.
    #[serde(default = "default_sample_target")]
    pub sample_target: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_words: default_top_n(),
            top_issues: default_top_n(),
            sample_edge: default_sample_edge(),
            sample_target: default_sample_target(),
        }
    }
}

fn default_top_n() -> usize {
    10
}

fn default_sample_edge() -> usize {
    5
}

fn default_sample_target() -> usize {
    20
}

/// Wire protocol spoken by a delegate endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Single prompt in, `response` text out (Ollama `/api/generate`).
    Completion,
    /// System/user messages in, `choices[0].message.content` out.
    Chat,
}

/// One delegate endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegateConfig {
    /// Name used in logs and answer attribution.
    pub name: String,

    /// Protocol variant.
    pub protocol: Protocol,

    /// Server root URL; the protocol's route is appended.
    pub url: String,

    /// Model to request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-attempt timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Local Ollama first, then an OpenAI-compatible server.
pub fn default_delegates() -> Vec<DelegateConfig> {
    vec![
        DelegateConfig {
            name: "ollama".to_string(),
            protocol: Protocol::Completion,
            url: "http://localhost:11434".to_string(),
            model: default_model(),
            timeout_seconds: default_timeout(),
        },
        DelegateConfig {
            name: "transformers".to_string(),
            protocol: Protocol::Chat,
            url: "http://localhost:8000".to_string(),
            model: default_model(),
            timeout_seconds: default_timeout(),
        },
    ]
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// where the CLI provides an explicit value.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(format) = args.format {
            self.general.format = format;
        }

        if args.no_delegates {
            self.delegates.clear();
            return;
        }

        for delegate in &mut self.delegates {
            if let Some(ref model) = args.model {
                delegate.model = model.clone();
            }
            if let Some(timeout) = args.timeout {
                delegate.timeout_seconds = timeout;
            }

            let url_override = match delegate.protocol {
                Protocol::Completion => args.ollama_url.as_ref(),
                Protocol::Chat => args.chat_url.as_ref(),
            };
            if let Some(url) = url_override {
                delegate.url = url.clone();
            }
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
