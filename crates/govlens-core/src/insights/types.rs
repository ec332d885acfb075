//! Core types for the Insight Engine

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::rows::AggregateRow;

/// Heuristic that produced a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    /// A handful of groups hold most of the total
    Concentration,
    /// Groups well below the mean
    Disparity,
    /// Values too similar to be organic
    Uniformity,
    /// Groups reporting exactly zero
    ZeroActivity,
    /// Large gap between top and bottom age bands
    DemographicSkew,
    /// Latest period-on-period change far above the norm
    SpikeDrop,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::Concentration => "concentration",
            InsightKind::Disparity => "disparity",
            InsightKind::Uniformity => "uniformity",
            InsightKind::ZeroActivity => "zero_activity",
            InsightKind::DemographicSkew => "demographic_skew",
            InsightKind::SpikeDrop => "spike_drop",
        }
    }

    /// Card title shown on the dashboard
    pub fn title(&self) -> &'static str {
        match self {
            InsightKind::Concentration => "High Concentration Alert",
            InsightKind::Disparity => "Regional Disparity",
            InsightKind::Uniformity => "Suspicious Uniformity",
            InsightKind::ZeroActivity => "Zero-Activity Regions",
            InsightKind::DemographicSkew => "Demographic Skew",
            InsightKind::SpikeDrop => "Operational Spike/Drop",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            InsightKind::Concentration => {
                "Review service distribution and balance load across regions"
            }
            InsightKind::Disparity => "Target support and outreach to underperforming regions",
            InsightKind::Uniformity => "Validate upstream data pipelines for aggregation artifacts",
            InsightKind::ZeroActivity => {
                "Investigate operational availability and capture mechanisms"
            }
            InsightKind::DemographicSkew => "Review age-specific policies and outreach programs",
            InsightKind::SpikeDrop => "Audit recent operations and capacity planning",
        }
    }

    /// Rationale used when a rule does not supply its own
    pub fn default_reason(&self) -> &'static str {
        match self {
            InsightKind::Concentration => "Concentration threshold exceeded based on percentile share",
            InsightKind::Disparity => "Compared against dataset mean",
            InsightKind::Uniformity => "Low variance relative to mean may indicate data issues",
            InsightKind::ZeroActivity => "Presence of zeros in active dataset slice",
            InsightKind::DemographicSkew => "Relative imbalance across age bands",
            InsightKind::SpikeDrop => "Change exceeds average period-on-period change",
        }
    }
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InsightKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "concentration" => Ok(InsightKind::Concentration),
            "disparity" => Ok(InsightKind::Disparity),
            "uniformity" => Ok(InsightKind::Uniformity),
            "zero_activity" => Ok(InsightKind::ZeroActivity),
            "demographic_skew" => Ok(InsightKind::DemographicSkew),
            "spike_drop" => Ok(InsightKind::SpikeDrop),
            _ => Err(format!("Unknown insight kind: {}", s)),
        }
    }
}

/// Severity level of an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    /// Numeric rank for callers ordering findings for display
    /// (higher = more urgent); the engine itself never reorders
    pub fn priority(&self) -> u8 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// A finding produced by one rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub title: String,
    pub severity: Severity,
    /// One-line narrative (e.g., "3 districts show zero activity")
    pub insight: String,
    pub recommendation: String,
    /// Why the rule fired
    pub reason: String,
}

impl Insight {
    /// Create a finding with the kind's title, recommendation and default reason
    pub fn new(kind: InsightKind, severity: Severity, insight: impl Into<String>) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            severity,
            insight: insight.into(),
            recommendation: kind.recommendation().to_string(),
            reason: kind.default_reason().to_string(),
        }
    }

    /// Replace the rationale
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }
}

/// Everything the engine looks at for one evaluation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightRequest {
    pub dataset_name: String,
    pub metric_field: Option<String>,
    pub group_by_field: Option<String>,
    pub group_rows: Option<Vec<AggregateRow>>,
    pub trends_series: Option<Vec<AggregateRow>>,
    /// Field holding the period label in trend rows (`period` when unset)
    #[serde(default)]
    pub period_field: Option<String>,
}

impl InsightRequest {
    pub fn new(dataset_name: impl Into<String>) -> Self {
        Self {
            dataset_name: dataset_name.into(),
            ..Default::default()
        }
    }

    pub fn with_metric(mut self, field: impl Into<String>) -> Self {
        self.metric_field = Some(field.into());
        self
    }

    pub fn with_group_by(mut self, field: impl Into<String>) -> Self {
        self.group_by_field = Some(field.into());
        self
    }

    pub fn with_group_rows(mut self, rows: Vec<AggregateRow>) -> Self {
        self.group_rows = Some(rows);
        self
    }

    pub fn with_trends(mut self, rows: Vec<AggregateRow>) -> Self {
        self.trends_series = Some(rows);
        self
    }

    pub fn with_period_field(mut self, field: impl Into<String>) -> Self {
        self.period_field = Some(field.into());
        self
    }
}
