//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.cellfreq.toml` files.

use crate::models::{CohortFilter, ComparisonFilter};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".cellfreq.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Cohort used by the compare and compare-stats views.
    #[serde(default)]
    pub comparison: ComparisonConfig,

    /// Default predicate for the filter view.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path. Results go to stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Responder comparison cohort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonConfig {
    #[serde(default = "default_sample_type")]
    pub sample_type: String,

    #[serde(default = "default_treatment")]
    pub treatment: String,

    #[serde(default = "default_condition")]
    pub condition: String,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            sample_type: default_sample_type(),
            treatment: default_treatment(),
            condition: default_condition(),
        }
    }
}

impl From<&ComparisonConfig> for ComparisonFilter {
    fn from(config: &ComparisonConfig) -> Self {
        Self {
            sample_type: config.sample_type.clone(),
            treatment: config.treatment.clone(),
            condition: config.condition.clone(),
        }
    }
}

/// Filter view defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_sample_type")]
    pub sample_type: String,

    #[serde(default = "default_condition")]
    pub condition: String,

    #[serde(default = "default_treatment")]
    pub treatment: String,

    #[serde(default)]
    pub time_from_treatment_start: i64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            sample_type: default_sample_type(),
            condition: default_condition(),
            treatment: default_treatment(),
            time_from_treatment_start: 0,
        }
    }
}

impl From<&FilterConfig> for CohortFilter {
    fn from(config: &FilterConfig) -> Self {
        Self {
            sample_type: config.sample_type.clone(),
            time_from_treatment_start: config.time_from_treatment_start,
            treatment: config.treatment.clone(),
            condition: config.condition.clone(),
        }
    }
}

fn default_sample_type() -> String {
    "PBMC".to_string()
}

fn default_treatment() -> String {
    "tr1".to_string()
}

fn default_condition() -> String {
    "melanoma".to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Decimal places for relative frequencies in Markdown tables.
    #[serde(default = "default_frequency_precision")]
    pub frequency_precision: usize,

    /// Show group sizes, t and df next to p-values in Markdown.
    #[serde(default = "default_true")]
    pub include_statistics: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            frequency_precision: default_frequency_precision(),
            include_statistics: true,
        }
    }
}

fn default_frequency_precision() -> usize {
    2
}

fn default_true() -> bool {
    true
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
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.cellfreq.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only explicitly provided values override.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref sample_type) = args.sample_type {
            self.comparison.sample_type = sample_type.clone();
            self.filter.sample_type = sample_type.clone();
        }
        if let Some(ref treatment) = args.treatment {
            self.comparison.treatment = treatment.clone();
            self.filter.treatment = treatment.clone();
        }
        if let Some(ref condition) = args.condition {
            self.comparison.condition = condition.clone();
            self.filter.condition = condition.clone();
        }
        if let Some(time) = args.time_from_treatment_start {
            self.filter.time_from_treatment_start = time;
        }

        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
