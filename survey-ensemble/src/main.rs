//! Survey Ensemble (survey-ensemble) - Main entry point
//!
//! Reads a model registry listing, sub-classifier results, and science
//! results (all JSON), aggregates them, and writes the ensemble table as CSV
//! to a file or stdout.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use survey_common::config::{load_config_or_default, ConfigOverrides, Settings};
use survey_common::ModelRegistry;
use survey_ensemble::{aggregate, export, source};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for survey-ensemble
#[derive(Parser, Debug)]
#[command(name = "survey-ensemble")]
#[command(about = "Weighted ensemble of survey-specific science classifiers")]
#[command(version)]
struct Args {
    /// Model registry listing (JSON)
    #[arg(long)]
    registry: PathBuf,

    /// Sub-classifier results (JSON)
    #[arg(long)]
    subclassifier: PathBuf,

    /// Science model results (JSON)
    #[arg(long)]
    science: PathBuf,

    /// Survey classifier project id (keeps only that project's models)
    #[arg(long)]
    project_id: Option<i64>,

    /// CSV output path (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file (default: platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config =
        load_config_or_default(args.config.as_deref()).context("Failed to load configuration")?;
    let settings = Settings::resolve(
        &toml_config,
        ConfigOverrides {
            project_id: args.project_id,
            log_level: args.log_level.clone(),
            output_path: args.output.clone(),
        },
    )
    .context("Failed to resolve settings")?;

    init_tracing(&settings)?;

    info!(
        project_id = ?settings.project_id,
        classifier_url = ?settings.classifier_url,
        output = ?settings.output_path,
        "Starting survey ensemble"
    );

    let records = source::parse_model_records(&read(&args.registry)?)
        .with_context(|| format!("Failed to decode registry {}", args.registry.display()))?;
    let registry = match settings.project_id {
        Some(project_id) => ModelRegistry::for_project(records, project_id),
        None => ModelRegistry::from_records(records),
    }
    .context("Failed to build model registry")?;

    let subclassifier = source::parse_subclassifier_results(&read(&args.subclassifier)?)
        .with_context(|| {
            format!(
                "Failed to decode sub-classifier results {}",
                args.subclassifier.display()
            )
        })?;
    let science = source::parse_science_results(&read(&args.science)?)
        .with_context(|| format!("Failed to decode science results {}", args.science.display()))?;

    let results =
        aggregate(&subclassifier, &science, &registry).context("Ensemble aggregation failed")?;

    match &settings.output_path {
        Some(path) => {
            export::write_csv(&results, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => {
            let stdout = std::io::stdout();
            export::write_table(&results, stdout.lock()).context("Failed to write CSV to stdout")?;
        }
    }

    info!(series_count = results.len(), "Survey ensemble complete");
    Ok(())
}

fn read(path: &Path) -> Result<String> {
    source::read_document(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Logs go to stderr (or the configured file) so stdout carries only CSV
fn init_tracing(settings: &Settings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .with_context(|| format!("Invalid log level '{}'", settings.log_level))?;

    match &settings.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
