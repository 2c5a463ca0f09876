//! Rainfall (RR) Prediction CLI
//!
//! A command-line tool for listing the available models, predicting
//! rainfall for a single day and running batch predictions over
//! historical weather files.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use commands::{batch, models, predict};
use rainfall_lib::{
    predictor::{ArtifactRegistry, ModelVariant, RegistryConfig},
    FeatureRecord,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Rainfall (RR) Prediction CLI
#[derive(Parser)]
#[command(name = "rrp")]
#[command(author, version, long_about = None)]
#[command(about = "CLI for the Rainfall (RR) Prediction Dashboard")]
pub struct Cli {
    /// Directory holding the model artifacts (can also be set via RRP_MODEL_DIR env var)
    #[arg(long, env = "RRP_MODEL_DIR", global = true)]
    pub model_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short, global = true)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the available models and their evaluation scores
    Models,

    /// Predict rainfall for one day from manually entered measurements
    Predict {
        /// Minimum temperature (°C)
        #[arg(long, allow_hyphen_values = true)]
        tn: f64,

        /// Maximum temperature (°C)
        #[arg(long, allow_hyphen_values = true)]
        tx: f64,

        /// Average temperature (°C)
        #[arg(long, allow_hyphen_values = true)]
        tavg: f64,

        /// Average relative humidity (%)
        #[arg(long, allow_hyphen_values = true)]
        rh_avg: f64,

        /// Maximum wind speed (m/s)
        #[arg(long, allow_hyphen_values = true)]
        ff_x: f64,

        /// Average wind speed (m/s)
        #[arg(long, allow_hyphen_values = true)]
        ff_avg: f64,

        /// Date the prediction is for (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Model to use (baseline or tuned)
        #[arg(long, short)]
        model: Option<String>,
    },

    /// Predict every row of a semicolon-delimited weather file
    Batch {
        /// Input file with a header row
        file: PathBuf,

        /// Model to use (baseline or tuned)
        #[arg(long, short)]
        model: Option<String>,

        /// Write the results as CSV to this file or directory
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Include every input column in the export
        #[arg(long)]
        full: bool,

        /// Number of input rows to preview
        #[arg(long, default_value_t = 5)]
        preview: usize,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

/// Flag, then config file, then baseline
fn resolve_variant(flag: Option<String>, config: &config::Config) -> Result<ModelVariant> {
    match flag.or_else(|| config.default_model.clone()) {
        Some(name) => name
            .parse::<ModelVariant>()
            .with_context(|| format!("Invalid model '{}'", name)),
        None => Ok(ModelVariant::Baseline),
    }
}

fn resolve_format(
    flag: Option<output::OutputFormat>,
    config: &config::Config,
) -> Result<output::OutputFormat> {
    if let Some(format) = flag {
        return Ok(format);
    }
    match &config.default_format {
        Some(name) => output::OutputFormat::from_str(name, true)
            .map_err(|e| anyhow::anyhow!("Invalid default_format '{}': {}", name, e)),
        None => Ok(output::OutputFormat::default()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = config::Config::load()?;
    let format = resolve_format(cli.format, &config)?;

    let registry = match cli.model_dir.or_else(|| config.model_dir.clone()) {
        Some(dir) => ArtifactRegistry::with_model_dir(dir),
        None => ArtifactRegistry::new(RegistryConfig::default()),
    };

    match cli.command {
        Commands::Models => {
            models::list_models(&registry, format)?;
        }
        Commands::Predict {
            tn,
            tx,
            tavg,
            rh_avg,
            ff_x,
            ff_avg,
            date,
            model,
        } => {
            let variant = resolve_variant(model, &config)?;
            let record = FeatureRecord::new(tn, tx, tavg, rh_avg, ff_x, ff_avg);
            predict::predict(&registry, variant, record, date, format)?;
        }
        Commands::Batch {
            file,
            model,
            output,
            full,
            preview,
        } => {
            let variant = resolve_variant(model, &config)?;
            let options = batch::BatchOptions {
                file,
                output,
                full,
                preview,
            };
            batch::run_batch(&registry, variant, &options, format)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_variant_resolution_order() {
        let config = config::Config {
            default_model: Some("tuning".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_variant(Some("baseline".to_string()), &config).unwrap(),
            ModelVariant::Baseline
        );
        assert_eq!(resolve_variant(None, &config).unwrap(), ModelVariant::Tuned);
        assert_eq!(
            resolve_variant(None, &config::Config::default()).unwrap(),
            ModelVariant::Baseline
        );
        assert!(resolve_variant(Some("svm".to_string()), &config).is_err());
    }

    #[test]
    fn test_format_resolution_order() {
        let config = config::Config {
            default_format: Some("json".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_format(None, &config).unwrap(),
            output::OutputFormat::Json
        );
        assert_eq!(
            resolve_format(Some(output::OutputFormat::Table), &config).unwrap(),
            output::OutputFormat::Table
        );
    }
}
