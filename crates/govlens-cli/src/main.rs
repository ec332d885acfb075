//! GovLens CLI - Trend forecasts and insights for aggregate statistics
//!
//! Usage:
//!   govlens forecast --input trends.json --horizon 6     Forecast a series
//!   govlens insights --groups groups.json --group-by age   Run insight rules
//!   govlens thresholds                                   Show thresholds

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use clap::Parser;
use govlens_core::Thresholds;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    let thresholds =
        Thresholds::load(cli.config.as_deref()).context("Failed to load thresholds")?;

    match cli.command {
        Commands::Forecast {
            input,
            horizon,
            window,
            period_field,
            format,
        } => commands::cmd_forecast(&thresholds, &input, horizon, window, &period_field, format),
        Commands::Insights {
            groups,
            trends,
            dataset,
            metric,
            group_by,
            period_field,
            format,
        } => commands::cmd_insights(
            thresholds,
            commands::InsightInputs {
                groups: groups.as_deref(),
                trends: trends.as_deref(),
                dataset: &dataset,
                metric: metric.as_deref(),
                group_by: group_by.as_deref(),
                period_field: &period_field,
            },
            format,
        ),
        Commands::Thresholds => commands::cmd_thresholds(&thresholds, cli.config.as_deref()),
    }
}
