//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// cellfreq - immune-cell population frequencies and responder statistics
///
/// Loads a JSON dataset of sample records and prints one analysis view
/// as JSON or Markdown.
///
/// Examples:
///   cellfreq summary --data cohort.json
///   cellfreq compare-stats --data cohort.json --format markdown
///   cellfreq filter --data cohort.json --time-from-treatment-start 7
///   cellfreq report --data cohort.json --format markdown -o report.md
///   cellfreq --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Analysis view to produce
    #[arg(value_enum, required_unless_present = "init_config")]
    pub view: Option<View>,

    /// Dataset file (JSON array of sample records)
    #[arg(short, long, value_name = "FILE", env = "CELLFREQ_DATA")]
    pub data: Option<PathBuf>,

    /// Output format (json, markdown)
    #[arg(long, default_value = "json", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Output file path. Writes to stdout when omitted.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .cellfreq.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Sample type to select (default: PBMC)
    #[arg(long, value_name = "TYPE")]
    pub sample_type: Option<String>,

    /// Treatment to select (default: tr1)
    #[arg(long, value_name = "TREATMENT")]
    pub treatment: Option<String>,

    /// Subject condition to select (default: melanoma)
    #[arg(long, value_name = "CONDITION")]
    pub condition: Option<String>,

    /// Time from treatment start, filter view only (default: 0)
    #[arg(long, value_name = "TIME", allow_negative_numbers = true)]
    pub time_from_treatment_start: Option<i64>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .cellfreq.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Analysis view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum View {
    /// Every sample record
    Samples,
    /// Relative frequency of each population per sample
    Summary,
    /// Responder vs non-responder frequencies
    Compare,
    /// Per-population Welch's t-test
    CompareStats,
    /// Subject and sample counts for a cohort filter
    Filter,
    /// All of the above in one document
    Report,
}

/// Output format for the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON format (default)
    #[default]
    Json,
    /// Markdown format
    Markdown,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        let Some(ref data) = self.data else {
            return Err("A dataset is required: pass --data or set CELLFREQ_DATA".to_string());
        };
        if !data.is_file() {
            return Err(format!("Dataset file does not exist: {}", data.display()));
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `--quiet` wins over both `--verbose` and a config file asking for
    /// verbose output.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/cohort.json")
    }

    fn make_args() -> Args {
        Args {
            view: Some(View::Summary),
            data: Some(fixture()),
            format: OutputFormat::Json,
            output: None,
            config: None,
            sample_type: None,
            treatment: None,
            condition: None,
            time_from_treatment_start: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_view_and_filters() {
        let args = Args::try_parse_from([
            "cellfreq",
            "filter",
            "--data",
            "cohort.json",
            "--sample-type",
            "WB",
            "--time-from-treatment-start",
            "14",
            "--format",
            "markdown",
        ])
        .unwrap();

        assert_eq!(args.view, Some(View::Filter));
        assert_eq!(args.sample_type.as_deref(), Some("WB"));
        assert_eq!(args.time_from_treatment_start, Some(14));
        assert_eq!(args.format, OutputFormat::Markdown);
    }

    #[test]
    fn test_parse_compare_stats_view() {
        let args = Args::try_parse_from(["cellfreq", "compare-stats", "-d", "x.json"]).unwrap();
        assert_eq!(args.view, Some(View::CompareStats));
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_view_required_without_init_config() {
        assert!(Args::try_parse_from(["cellfreq", "--data", "x.json"]).is_err());
        assert!(Args::try_parse_from(["cellfreq", "--init-config"]).is_ok());
    }

    #[test]
    fn test_validation_ok() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_missing_dataset() {
        let mut args = make_args();
        args.data = Some(PathBuf::from("/nonexistent/cohort.json"));
        assert!(args.validate().is_err());

        args.data = None;
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
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_level_from_config() {
        let mut args = make_args();
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }
}
