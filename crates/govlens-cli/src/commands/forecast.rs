//! Forecast command implementation

use std::path::Path;

use anyhow::Result;
use govlens_core::forecast::{forecast_with, rolling_average, trend_highlights};
use govlens_core::rows::{safe_number, series_from_rows};
use govlens_core::{ForecastPoint, Horizon, LinearFit, Thresholds, TimePoint, TrendHighlights};
use serde::Serialize;

use super::{load_rows, truncate};
use crate::cli::OutputFormat;

/// Everything the forecast panel shows
#[derive(Debug, Serialize)]
pub struct ForecastReport {
    pub horizon: usize,
    pub window: usize,
    pub fit: LinearFit,
    pub points: Vec<ForecastPoint>,
    pub rolling: Vec<TimePoint>,
    pub highlights: TrendHighlights,
}

impl ForecastReport {
    pub fn build(series: &[TimePoint], horizon: Horizon, window: usize, z: f64) -> Self {
        let values: Vec<f64> = series.iter().map(|p| safe_number(p.value)).collect();
        Self {
            horizon: horizon.steps(),
            window,
            fit: LinearFit::fit(&values, z),
            points: forecast_with(series, horizon, z),
            rolling: rolling_average(series, window),
            highlights: trend_highlights(series, window),
        }
    }

    /// No observed periods to analyze
    pub fn is_empty(&self) -> bool {
        self.rolling.is_empty()
    }
}

pub fn cmd_forecast(
    thresholds: &Thresholds,
    input: &Path,
    horizon: Horizon,
    window: Option<usize>,
    period_field: &str,
    format: OutputFormat,
) -> Result<()> {
    let rows = load_rows(input)?;
    let series = series_from_rows(&rows, period_field);
    let window = window.unwrap_or(thresholds.rolling_window);
    if window == 0 {
        anyhow::bail!("--window must be at least 1");
    }

    let report = ForecastReport::build(&series, horizon, window, thresholds.band_z);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", render_forecast(&report)),
    }

    Ok(())
}

pub fn render_forecast(report: &ForecastReport) -> String {
    let mut out = String::new();

    out.push('\n');
    out.push_str(&format!(
        "📈 Trend Forecast (horizon {}, {}-period rolling average)\n",
        report.horizon, report.window
    ));
    out.push_str("   ─────────────────────────────────────────────────────────────\n");

    if report.is_empty() {
        out.push_str("   Time-based analysis not available for this dataset.\n");
        return out;
    }

    out.push_str(&format!(
        "   {:12} │ {:>10} │ {:>10} │ {:>10} │ {:>10}\n",
        "Period", "Actual", "Forecast", "Lower", "Upper"
    ));
    out.push_str("   ─────────────┼────────────┼────────────┼────────────┼───────────\n");
    for p in &report.points {
        let actual = p
            .actual
            .map(|a| format!("{:.2}", a))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "   {:12} │ {:>10} │ {:>10.2} │ {:>10.2} │ {:>10.2}\n",
            truncate(&p.period, 12),
            actual,
            p.forecast,
            p.lower,
            p.upper
        ));
    }
    out.push_str(
        "   Forecast based on historical trend using linear regression. For indicative use only.\n",
    );

    let h = &report.highlights;
    out.push('\n');
    out.push_str("   Trend highlights\n");
    out.push_str(&format!(
        "   Recent growth vs previous period: {:.1}%\n",
        h.recent_growth_pct
    ));
    out.push_str(&format!("   {}\n", h.seasonal_hint));
    out.push('\n');
    out.push_str(&format!("   Rolling average ({}-period)\n", report.window));
    for p in &h.recent_rolling {
        out.push_str(&format!("   {}: {:.2}\n", p.period, p.value));
    }

    out
}
