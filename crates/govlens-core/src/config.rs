//! Insight and forecast thresholds
//!
//! Every constant the rule battery and the forecaster depend on lives in
//! [`Thresholds`]. Values are resolved in two layers:
//! 1. An override file (explicit path, or
//!    `~/.local/share/govlens/config/thresholds.toml`)
//! 2. Embedded defaults compiled into the binary
//!
//! Override files only need the keys they change.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/thresholds.toml");

/// Tunable thresholds for the insight rules and forecaster
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    /// Minimum number of groups before any group rule runs
    pub min_groups: usize,
    /// Number of leading groups counted for concentration
    pub top_count: usize,
    /// Top-share at which concentration is reported (medium)
    pub concentration_medium: f64,
    /// Top-share at which concentration becomes high severity
    pub concentration_high: f64,
    /// Fraction of the mean below which a group underperforms
    pub disparity_ratio: f64,
    /// Underperformer share above which disparity is medium
    pub disparity_medium_share: f64,
    /// Coefficient of variation below which values look suspiciously uniform
    pub uniformity_cv: f64,
    /// Zero-group share above which zero activity is medium
    pub zero_medium_share: f64,
    /// Substring of the group-by field that enables the skew rule
    pub skew_field_pattern: String,
    /// Top-to-tail ratio that counts as demographic skew
    pub skew_ratio: f64,
    /// Minimum series length for the spike/drop rule
    pub spike_min_points: usize,
    /// Multiple of the average change that counts as a spike or drop
    pub spike_multiplier: f64,
    /// Default rolling-average window
    pub rolling_window: usize,
    /// z-score used for the forecast confidence band
    pub band_z: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_groups: 3,
            top_count: 5,
            concentration_medium: 0.40,
            concentration_high: 0.60,
            disparity_ratio: 0.5,
            disparity_medium_share: 0.30,
            uniformity_cv: 0.05,
            zero_medium_share: 0.10,
            skew_field_pattern: "age".to_string(),
            skew_ratio: 2.0,
            spike_min_points: 6,
            spike_multiplier: 2.0,
            rolling_window: 3,
            band_z: 1.96,
        }
    }
}

impl Thresholds {
    /// Load thresholds, preferring `override_path`, then the data-dir override,
    /// then the embedded defaults
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let content = match override_path {
            Some(path) => read_config(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => read_config(&path)?,
                _ => DEFAULT_CONFIG.to_string(),
            },
        };

        Self::from_toml(&content)
    }

    /// Parse thresholds from TOML layered over the defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid thresholds TOML: {}", e)))?;

        let mut t = Thresholds::default();

        if let Some(groups) = raw.groups {
            if let Some(v) = groups.min_groups {
                t.min_groups = v;
            }
        }
        if let Some(c) = raw.concentration {
            if let Some(v) = c.top_count {
                t.top_count = v;
            }
            if let Some(v) = c.medium {
                t.concentration_medium = v;
            }
            if let Some(v) = c.high {
                t.concentration_high = v;
            }
        }
        if let Some(d) = raw.disparity {
            if let Some(v) = d.below_mean_ratio {
                t.disparity_ratio = v;
            }
            if let Some(v) = d.medium_share {
                t.disparity_medium_share = v;
            }
        }
        if let Some(u) = raw.uniformity {
            if let Some(v) = u.max_cv {
                t.uniformity_cv = v;
            }
        }
        if let Some(z) = raw.zero_activity {
            if let Some(v) = z.medium_share {
                t.zero_medium_share = v;
            }
        }
        if let Some(s) = raw.demographic_skew {
            if let Some(v) = s.field_pattern {
                t.skew_field_pattern = v;
            }
            if let Some(v) = s.ratio {
                t.skew_ratio = v;
            }
        }
        if let Some(s) = raw.spike {
            if let Some(v) = s.min_points {
                t.spike_min_points = v;
            }
            if let Some(v) = s.multiplier {
                t.spike_multiplier = v;
            }
        }
        if let Some(f) = raw.forecast {
            if let Some(v) = f.rolling_window {
                t.rolling_window = v;
            }
            if let Some(v) = f.band_z {
                t.band_z = v;
            }
        }

        t.validate()?;
        Ok(t)
    }

    /// Render the effective thresholds in the same TOML layout they load from
    pub fn to_toml(&self) -> Result<String> {
        let raw = RawConfig {
            groups: Some(RawGroups {
                min_groups: Some(self.min_groups),
            }),
            concentration: Some(RawConcentration {
                top_count: Some(self.top_count),
                medium: Some(self.concentration_medium),
                high: Some(self.concentration_high),
            }),
            disparity: Some(RawDisparity {
                below_mean_ratio: Some(self.disparity_ratio),
                medium_share: Some(self.disparity_medium_share),
            }),
            uniformity: Some(RawUniformity {
                max_cv: Some(self.uniformity_cv),
            }),
            zero_activity: Some(RawZeroActivity {
                medium_share: Some(self.zero_medium_share),
            }),
            demographic_skew: Some(RawSkew {
                field_pattern: Some(self.skew_field_pattern.clone()),
                ratio: Some(self.skew_ratio),
            }),
            spike: Some(RawSpike {
                min_points: Some(self.spike_min_points),
                multiplier: Some(self.spike_multiplier),
            }),
            forecast: Some(RawForecast {
                rolling_window: Some(self.rolling_window),
                band_z: Some(self.band_z),
            }),
        };

        toml::to_string(&raw).map_err(|e| Error::Config(format!("Failed to render TOML: {}", e)))
    }

    fn validate(&self) -> Result<()> {
        let shares = [
            ("concentration.medium", self.concentration_medium),
            ("concentration.high", self.concentration_high),
            ("disparity.medium_share", self.disparity_medium_share),
            ("zero_activity.medium_share", self.zero_medium_share),
        ];
        for (name, value) in shares {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!(
                    "{} must be between 0 and 1, got {}",
                    name, value
                )));
            }
        }
        if self.concentration_medium > self.concentration_high {
            return Err(Error::Config(
                "concentration.medium must not exceed concentration.high".to_string(),
            ));
        }
        if self.min_groups == 0 {
            return Err(Error::Config("groups.min_groups must be at least 1".to_string()));
        }
        if self.top_count == 0 {
            return Err(Error::Config("concentration.top_count must be positive".to_string()));
        }
        if self.rolling_window == 0 {
            return Err(Error::Config("forecast.rolling_window must be positive".to_string()));
        }
        let non_negative = [
            ("disparity.below_mean_ratio", self.disparity_ratio),
            ("uniformity.max_cv", self.uniformity_cv),
            ("demographic_skew.ratio", self.skew_ratio),
            ("spike.multiplier", self.spike_multiplier),
            ("forecast.band_z", self.band_z),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("govlens").join("config").join("thresholds.toml"))
}

fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read config {}: {}",
            path.display(),
            e
        ))
    })
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize, Serialize)]
struct RawConfig {
    groups: Option<RawGroups>,
    concentration: Option<RawConcentration>,
    disparity: Option<RawDisparity>,
    uniformity: Option<RawUniformity>,
    zero_activity: Option<RawZeroActivity>,
    demographic_skew: Option<RawSkew>,
    spike: Option<RawSpike>,
    forecast: Option<RawForecast>,
}

#[derive(Debug, Deserialize, Serialize)]
struct RawGroups {
    min_groups: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize)]
struct RawConcentration {
    top_count: Option<usize>,
    medium: Option<f64>,
    high: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize)]
struct RawDisparity {
    below_mean_ratio: Option<f64>,
    medium_share: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize)]
struct RawUniformity {
    max_cv: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize)]
struct RawZeroActivity {
    medium_share: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize)]
struct RawSkew {
    field_pattern: Option<String>,
    ratio: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize)]
struct RawSpike {
    min_points: Option<usize>,
    multiplier: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize)]
struct RawForecast {
    rolling_window: Option<usize>,
    band_z: Option<f64>,
}
