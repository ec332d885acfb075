//! Forecaster
//!
//! Smooths a time series with a rolling average and extrapolates it with an
//! ordinary least squares trend line. The confidence band is `z × SE` of the
//! residuals and has the same width at every point, historical or future.
//!
//! Output is advisory ("for indicative use only"): malformed values are
//! coerced to 0 and degenerate fits fall back to a flat line, so none of
//! these functions can fail.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::Thresholds;
use crate::error::{Error, Result};
use crate::rows::{safe_number, TimePoint};

/// Number of trailing rolling-average points shown in highlights
const ROLLING_TAIL: usize = 6;

/// Series length at which a seasonal pattern becomes plausible
const SEASONAL_MIN_POINTS: usize = 12;

/// How far past the last observation to forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "usize", try_from = "usize")]
pub enum Horizon {
    #[default]
    Short,
    Long,
}

impl Horizon {
    pub fn steps(&self) -> usize {
        match self {
            Horizon::Short => 3,
            Horizon::Long => 6,
        }
    }
}

impl From<Horizon> for usize {
    fn from(h: Horizon) -> usize {
        h.steps()
    }
}

impl TryFrom<usize> for Horizon {
    type Error = Error;

    fn try_from(steps: usize) -> Result<Self> {
        match steps {
            3 => Ok(Horizon::Short),
            6 => Ok(Horizon::Long),
            other => Err(Error::InvalidData(format!(
                "Unsupported forecast horizon: {} (expected 3 or 6)",
                other
            ))),
        }
    }
}

impl FromStr for Horizon {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let steps: usize = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidData(format!("Invalid forecast horizon: {}", s)))?;
        Horizon::try_from(steps)
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.steps())
    }
}

/// One row of forecast output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub period: String,
    /// Observed value; `None` for horizon periods
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<f64>,
    pub forecast: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Least-squares trend line over series indices
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Residual standard error, 0 when it cannot be estimated
    pub std_error: f64,
    /// Confidence multiplier applied to `std_error`
    pub z: f64,
}

impl LinearFit {
    /// Fit `value = intercept + slope * index` over `values`
    pub fn fit(values: &[f64], z: f64) -> Self {
        let n = values.len();
        if n == 0 {
            return Self {
                slope: 0.0,
                intercept: 0.0,
                std_error: 0.0,
                z,
            };
        }

        let nf = n as f64;
        let mean_x = (nf - 1.0) / 2.0;
        let mean_y = values.iter().sum::<f64>() / nf;

        let mut num = 0.0;
        let mut den = 0.0;
        for (i, y) in values.iter().enumerate() {
            let dx = i as f64 - mean_x;
            num += dx * (y - mean_y);
            den += dx * dx;
        }
        // Sums over huge values can overflow; keep the line finite
        let slope = if den == 0.0 { 0.0 } else { safe_number(num / den) };
        let intercept = safe_number(mean_y - slope * mean_x);

        let sse: f64 = values
            .iter()
            .enumerate()
            .map(|(i, y)| {
                let r = y - (intercept + slope * i as f64);
                r * r
            })
            .sum();
        let std_error = safe_number((sse / n.saturating_sub(2).max(1) as f64).sqrt());

        Self {
            slope,
            intercept,
            std_error,
            z,
        }
    }

    /// Half-width of the confidence band
    pub fn band(&self) -> f64 {
        self.z * self.std_error
    }

    /// Fitted value at a series index
    pub fn at(&self, index: usize) -> f64 {
        self.intercept + self.slope * index as f64
    }

    fn point(&self, period: String, actual: Option<f64>, index: usize) -> ForecastPoint {
        let forecast = safe_number(self.at(index));
        let band = safe_number(self.band());
        ForecastPoint {
            period,
            actual,
            forecast,
            lower: safe_number(forecast - band),
            upper: safe_number(forecast + band),
        }
    }
}

/// Rolling mean over the trailing `window` points.
///
/// The first `window - 1` outputs average whatever history exists rather
/// than being left empty. A window of 0 behaves like 1, and non-finite
/// values count as 0.
pub fn rolling_average(series: &[TimePoint], window: usize) -> Vec<TimePoint> {
    let window = window.max(1);
    series
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let start = (i + 1).saturating_sub(window);
            let slice = &series[start..=i];
            let sum: f64 = slice.iter().map(|p| safe_number(p.value)).sum();
            let avg = safe_number(sum / slice.len() as f64);
            TimePoint {
                period: point.period.clone(),
                value: avg,
            }
        })
        .collect()
}

/// Linear forecast with the default 95% band
pub fn forecast(series: &[TimePoint], horizon: Horizon) -> Vec<ForecastPoint> {
    forecast_with(series, horizon, Thresholds::default().band_z)
}

/// Linear forecast with a caller-chosen band multiplier.
///
/// Returns one point per observation followed by `horizon` extrapolated
/// points labelled `+1`, `+2`, ...
pub fn forecast_with(series: &[TimePoint], horizon: Horizon, z: f64) -> Vec<ForecastPoint> {
    let values: Vec<f64> = series.iter().map(|p| safe_number(p.value)).collect();
    let fit = LinearFit::fit(&values, z);
    let n = values.len();

    tracing::debug!(
        points = n,
        horizon = horizon.steps(),
        slope = fit.slope,
        intercept = fit.intercept,
        std_error = fit.std_error,
        "Fitted forecast trend"
    );

    let mut out = Vec::with_capacity(n + horizon.steps());
    for (i, (point, value)) in series.iter().zip(&values).enumerate() {
        out.push(fit.point(point.period.clone(), Some(*value), i));
    }
    for h in 1..=horizon.steps() {
        out.push(fit.point(format!("+{}", h), None, n + h - 1));
    }
    out
}

/// Qualitative hint about periodicity, based on series length only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonalHint {
    PossibleSeasonality,
    NoSignal,
}

impl SeasonalHint {
    pub fn message(&self) -> &'static str {
        match self {
            SeasonalHint::PossibleSeasonality => {
                "Possible seasonal pattern detected via monthly periodicity."
            }
            SeasonalHint::NoSignal => "No strong seasonal signal detected.",
        }
    }
}

impl fmt::Display for SeasonalHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Summary card shown next to the forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendHighlights {
    /// Last period vs previous, in percent (previous floored at 1)
    pub recent_growth_pct: f64,
    pub seasonal_hint: SeasonalHint,
    /// Trailing rolling-average points
    pub recent_rolling: Vec<TimePoint>,
}

pub fn trend_highlights(series: &[TimePoint], window: usize) -> TrendHighlights {
    let n = series.len();
    let recent_growth_pct = if n >= 2 {
        let last = safe_number(series[n - 1].value);
        let prev = safe_number(series[n - 2].value);
        safe_number((last - prev) / prev.max(1.0) * 100.0)
    } else {
        0.0
    };

    let seasonal_hint = if n >= SEASONAL_MIN_POINTS {
        SeasonalHint::PossibleSeasonality
    } else {
        SeasonalHint::NoSignal
    };

    let rolling = rolling_average(series, window);
    let recent_rolling = rolling[rolling.len().saturating_sub(ROLLING_TAIL)..].to_vec();

    TrendHighlights {
        recent_growth_pct,
        seasonal_hint,
        recent_rolling,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> Vec<TimePoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| TimePoint::new(format!("2024-{:02}", i + 1), *v))
            .collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_forecast_length() {
        for n in 0..8 {
            let s = series(&vec![1.0; n]);
            assert_eq!(forecast(&s, Horizon::Short).len(), n + 3);
            assert_eq!(forecast(&s, Horizon::Long).len(), n + 6);
        }
    }

    #[test]
    fn test_rolling_average_partial_windows() {
        let s = series(&[3.0, 6.0, 9.0, 12.0]);
        let rolled = rolling_average(&s, 3);
        let values: Vec<f64> = rolled.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![3.0, 4.5, 6.0, 9.0]);
        let labels: Vec<&str> = rolled.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(labels, vec!["2024-01", "2024-02", "2024-03", "2024-04"]);
    }

    #[test]
    fn test_rolling_average_zero_window() {
        let s = series(&[1.0, 2.0]);
        assert_eq!(rolling_average(&s, 0), s);
        assert!(rolling_average(&[], 3).is_empty());
    }

    #[test]
    fn test_constant_series_is_flat() {
        let s = series(&[7.0; 5]);
        let fit = LinearFit::fit(&[7.0; 5], 1.96);
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.band(), 0.0);

        for p in forecast(&s, Horizon::Short) {
            assert!(approx(p.forecast, 7.0));
            assert_eq!(p.lower, p.forecast);
            assert_eq!(p.upper, p.forecast);
        }
    }

    #[test]
    fn test_perfect_line_extrapolates() {
        let s = series(&[1.0, 3.0, 5.0, 7.0]);
        let out = forecast(&s, Horizon::Short);

        assert_eq!(out[0].actual, Some(1.0));
        assert_eq!(out[4].period, "+1");
        assert_eq!(out[4].actual, None);
        assert!(approx(out[4].forecast, 9.0));
        assert!(approx(out[6].forecast, 13.0));
        assert!(approx(out[6].upper - out[6].lower, 0.0));
    }

    #[test]
    fn test_band_is_uniform() {
        let s = series(&[2.0, 9.0, 4.0, 11.0, 5.0]);
        let out = forecast(&s, Horizon::Long);
        let width = out[0].upper - out[0].lower;
        assert!(width > 0.0);
        for p in &out {
            assert!(approx(p.upper - p.lower, width));
        }
    }

    #[test]
    fn test_residual_standard_error() {
        // fit of [0, 2, 1] is y = 0.5x + 0.5, residuals -0.5, 1.0, -0.5
        let fit = LinearFit::fit(&[0.0, 2.0, 1.0], 1.96);
        assert!(approx(fit.slope, 0.5));
        assert!(approx(fit.intercept, 0.5));
        assert!(approx(fit.std_error, 1.5_f64.sqrt()));
        assert!(approx(fit.band(), 1.96 * 1.5_f64.sqrt()));
    }

    #[test]
    fn test_empty_series() {
        let out = forecast(&[], Horizon::Short);
        let labels: Vec<&str> = out.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(labels, vec!["+1", "+2", "+3"]);
        for p in out {
            assert_eq!(p.actual, None);
            assert_eq!((p.forecast, p.lower, p.upper), (0.0, 0.0, 0.0));
        }
    }

    #[test]
    fn test_single_point() {
        let out = forecast(&series(&[42.0]), Horizon::Short);
        assert_eq!(out.len(), 4);
        for p in out {
            assert_eq!(p.forecast, 42.0);
            assert_eq!(p.upper, 42.0);
        }
    }

    #[test]
    fn test_non_finite_values_coerced() {
        let s = vec![
            TimePoint {
                period: "a".into(),
                value: f64::NAN,
            },
            TimePoint {
                period: "b".into(),
                value: 4.0,
            },
        ];
        let out = forecast(&s, Horizon::Short);
        assert_eq!(out[0].actual, Some(0.0));
        assert!(out.iter().all(|p| p.forecast.is_finite() && p.upper.is_finite()));
    }

    #[test]
    fn test_rolling_average_coerces_non_finite() {
        let s = vec![
            TimePoint {
                period: "a".into(),
                value: f64::NAN,
            },
            TimePoint {
                period: "b".into(),
                value: 4.0,
            },
        ];
        let rolled = rolling_average(&s, 2);
        assert_eq!(rolled[0].value, 0.0);
        assert_eq!(rolled[1].value, 2.0);
        assert!(trend_highlights(&s, 2)
            .recent_rolling
            .iter()
            .all(|p| p.value.is_finite()));
    }

    #[test]
    fn test_huge_values_stay_finite() {
        let out = forecast(&series(&[1e308, 1e308]), Horizon::Short);
        assert_eq!(out.len(), 5);
        for p in &out {
            assert!(p.forecast.is_finite());
            assert!(p.lower.is_finite() && p.upper.is_finite());
        }
        let fit = LinearFit::fit(&[1e308, -1e308, 1e308], 1.96);
        assert!(fit.slope.is_finite() && fit.intercept.is_finite() && fit.std_error.is_finite());
    }

    #[test]
    fn test_forecast_is_deterministic() {
        let s = series(&[5.0, 1.0, 8.0, 3.0, 9.0]);
        let a = serde_json::to_string(&forecast(&s, Horizon::Long)).unwrap();
        let b = serde_json::to_string(&forecast(&s, Horizon::Long)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_actual_omitted_for_horizon_points() {
        let out = forecast(&series(&[1.0]), Horizon::Short);
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json[0]["actual"], 1.0);
        assert!(json[1].get("actual").is_none());
    }

    #[test]
    fn test_horizon_parsing() {
        assert_eq!("3".parse::<Horizon>().unwrap(), Horizon::Short);
        assert_eq!(Horizon::try_from(6).unwrap(), Horizon::Long);
        assert!("4".parse::<Horizon>().is_err());
        assert!("soon".parse::<Horizon>().is_err());
        assert_eq!(Horizon::default().steps(), 3);
    }

    #[test]
    fn test_trend_highlights() {
        let h = trend_highlights(&series(&[10.0, 20.0, 30.0, 45.0]), 3);
        assert!(approx(h.recent_growth_pct, 50.0));
        assert_eq!(h.seasonal_hint, SeasonalHint::NoSignal);
        assert_eq!(h.recent_rolling.len(), 4);

        let long = trend_highlights(&series(&[1.0; 12]), 3);
        assert_eq!(long.seasonal_hint, SeasonalHint::PossibleSeasonality);
        assert_eq!(long.recent_rolling.len(), 6);
        assert_eq!(long.recent_rolling[0].period, "2024-07");
    }

    #[test]
    fn test_trend_highlights_floors_previous_value() {
        let h = trend_highlights(&series(&[0.0, 5.0]), 3);
        assert!(approx(h.recent_growth_pct, 500.0));
        assert_eq!(trend_highlights(&series(&[9.0]), 3).recent_growth_pct, 0.0);
    }
}
