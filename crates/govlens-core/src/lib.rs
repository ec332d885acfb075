//! GovLens Core Library
//!
//! Client-side analytics for the GovLens dashboard:
//! - Aggregate row normalization (ordered fields, lenient numeric coercion)
//! - Forecaster: rolling averages and linear-trend forecasts with bands
//! - Insight engine: fixed battery of heuristic checks with severities
//! - Threshold configuration with embedded defaults and TOML overrides
//!
//! Everything except row parsing and config loading is a pure function of
//! its inputs. Nothing is cached or persisted between calls.

pub mod config;
pub mod error;
pub mod forecast;
pub mod insights;
pub mod rows;

pub use config::Thresholds;
pub use error::{Error, Result};
pub use forecast::{
    forecast, forecast_with, rolling_average, trend_highlights, ForecastPoint, Horizon, LinearFit,
    SeasonalHint, TrendHighlights,
};
pub use insights::{
    generate_insights, AnalysisContext, Insight, InsightEngine, InsightKind, InsightRequest, Rule,
    Severity,
};
pub use rows::{AggregateRow, FieldValue, GroupPoint, TimePoint};
