//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use govlens_core::rows::DEFAULT_PERIOD_FIELD;
use govlens_core::Horizon;

/// GovLens - Trend forecasts and insights for aggregate statistics
#[derive(Parser)]
#[command(name = "govlens")]
#[command(about = "Forecast trends and surface insights from aggregated dashboard data", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Threshold config file (defaults to the data-dir override, then built-in values)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Forecast a time series with a linear trend and confidence band
    Forecast {
        /// JSON file with an array of time-bucket rows
        #[arg(short, long)]
        input: PathBuf,

        /// Number of periods to forecast (3 or 6)
        #[arg(long, default_value = "3", value_parser = parse_horizon)]
        horizon: Horizon,

        /// Rolling-average window (defaults to the configured window)
        #[arg(short, long)]
        window: Option<usize>,

        /// Field holding the period label
        #[arg(long, default_value = DEFAULT_PERIOD_FIELD)]
        period_field: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Run the insight rules over grouped and/or time-series rows
    Insights {
        /// JSON file with an array of category rows (dimension field first)
        #[arg(short, long)]
        groups: Option<PathBuf>,

        /// JSON file with an array of time-bucket rows
        #[arg(short, long)]
        trends: Option<PathBuf>,

        /// Dataset name shown in the report header
        #[arg(long, default_value = "dataset")]
        dataset: String,

        /// Metric field label (display only)
        #[arg(long)]
        metric: Option<String>,

        /// Group-by field label (enables the demographic skew rule for age fields)
        #[arg(long)]
        group_by: Option<String>,

        /// Field holding the period label in trend rows
        #[arg(long, default_value = DEFAULT_PERIOD_FIELD)]
        period_field: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the effective thresholds as TOML
    Thresholds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

fn parse_horizon(s: &str) -> Result<Horizon, String> {
    s.parse::<Horizon>().map_err(|e| e.to_string())
}
