//! cellfreq - immune-cell population frequency analysis
//!
//! A CLI tool that loads a cohort of sample records, computes relative
//! frequencies of immune-cell populations, and compares responders
//! against non-responders with Welch's t-test.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (invalid arguments, unreadable dataset, etc.)

mod analysis;
mod cli;
mod cohort;
mod config;
mod engine;
mod error;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat, View};
use cohort::MemoryCohort;
use config::{Config, CONFIG_FILE};
use engine::Engine;
use models::{CohortFilter, ComparisonFilter};
use report::{Report, ReportMetadata, ViewOutput};
use std::path::Path;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Configuration is loaded before logging so `[general] verbose` applies
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(args.log_level(config.general.verbose));

    info!("cellfreq v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    if let Err(e) = run(args, config) {
        error!("Analysis failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .cellfreq.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("{} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("Created {} with default settings.", CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so stdout carries only the rendered view.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load the dataset, produce the requested view and write it out.
fn run(args: Args, config: Config) -> Result<()> {
    let Some(ref data) = args.data else {
        anyhow::bail!("No dataset given");
    };
    let Some(view) = args.view else {
        anyhow::bail!("No view given");
    };

    let cohort = MemoryCohort::load(data)?;
    info!(
        "Loaded {} subjects and {} samples from {}",
        cohort.subject_count(),
        cohort.sample_count(),
        data.display()
    );

    let comparison = ComparisonFilter::from(&config.comparison);
    let filter = CohortFilter::from(&config.filter);
    let engine = Engine::new(&cohort);

    let metadata = ReportMetadata {
        dataset: data.display().to_string(),
        generated_at: Utc::now(),
        subjects: cohort.subject_count(),
        samples: cohort.sample_count(),
        comparison: comparison.clone(),
        filter: filter.clone(),
    };

    let output = match view {
        View::Samples => ViewOutput::Samples(engine.samples()?),
        View::Summary => ViewOutput::Summary(engine.summary()?),
        View::Compare => ViewOutput::Compare(engine.compare(&comparison)?),
        View::CompareStats => ViewOutput::CompareStats(engine.compare_stats(&comparison)?),
        View::Filter => ViewOutput::Filter(engine.filter(&filter)?),
        View::Report => ViewOutput::Report(Box::new(Report {
            metadata: metadata.clone(),
            samples: engine.samples()?,
            summary: engine.summary()?,
            compare: engine.compare(&comparison)?,
            compare_stats: engine.compare_stats(&comparison)?,
            filter: engine.filter(&filter)?,
        })),
    };

    let rendered = match args.format {
        OutputFormat::Json => report::generate_json_report(&output)?,
        OutputFormat::Markdown => {
            report::generate_markdown_report(&output, &metadata, &config.report)
        }
    };

    match config.general.output {
        Some(ref path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write output to {}", path))?;
            info!("Output saved to: {}", path);
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is initialized, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("Warning: failed to load {}: {:#}", CONFIG_FILE, e);
            Ok(Config::default())
        }
    }
}
