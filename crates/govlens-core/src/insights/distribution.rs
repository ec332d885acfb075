//! Group distribution rules
//!
//! Checks on a category → value aggregate:
//! - Concentration: the largest groups hold most of the total
//! - Disparity: groups far below the mean
//! - Uniformity: spread too small to be organic (aggregation artifacts)
//! - Zero activity: groups reporting nothing
//! - Demographic skew: top vs bottom band when grouping by age
//!
//! All of them require at least `min_groups` groups.

use super::engine::{AnalysisContext, Rule};
use super::types::{Insight, InsightKind, Severity};

/// Maximum number of underperforming keys quoted in a narrative
const MAX_SAMPLE_KEYS: usize = 5;

pub struct ConcentrationRule;

impl Rule for ConcentrationRule {
    fn kind(&self) -> InsightKind {
        InsightKind::Concentration
    }

    fn name(&self) -> &'static str {
        "Concentration"
    }

    fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Option<Insight> {
        if !ctx.has_group_signal() {
            return None;
        }
        let t = ctx.thresholds;

        let top_count = t.top_count.min(ctx.ranked.len());
        let top_sum: f64 = ctx.ranked[..top_count].iter().map(|g| g.value).sum();
        let top_share = top_sum / ctx.group_total();

        if top_share < t.concentration_medium {
            return None;
        }

        let severity = if top_share >= t.concentration_high {
            Severity::High
        } else {
            Severity::Medium
        };

        Some(Insight::new(
            self.kind(),
            severity,
            format!(
                "Top {} {} account for {:.1}% of total",
                top_count,
                ctx.group_label(),
                top_share * 100.0
            ),
        ))
    }
}

pub struct DisparityRule;

impl Rule for DisparityRule {
    fn kind(&self) -> InsightKind {
        InsightKind::Disparity
    }

    fn name(&self) -> &'static str {
        "Disparity"
    }

    fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Option<Insight> {
        if !ctx.has_group_signal() {
            return None;
        }
        let t = ctx.thresholds;

        let n = ctx.groups.len();
        let mean = ctx.group_total() / n as f64;
        let cutoff = t.disparity_ratio * mean;
        let underperformers: Vec<&str> = ctx
            .groups
            .iter()
            .filter(|g| g.value < cutoff)
            .map(|g| g.key.as_str())
            .collect();

        if underperformers.is_empty() {
            return None;
        }

        let severity = if underperformers.len() as f64 > n as f64 * t.disparity_medium_share {
            Severity::Medium
        } else {
            Severity::Low
        };

        let sample = underperformers
            .iter()
            .take(MAX_SAMPLE_KEYS)
            .copied()
            .collect::<Vec<_>>()
            .join(", ");

        Some(
            Insight::new(
                self.kind(),
                severity,
                format!(
                    "{} {} below {:.0}% of average: {}",
                    underperformers.len(),
                    ctx.group_label(),
                    t.disparity_ratio * 100.0,
                    sample
                ),
            )
            .with_reason(format!("Compared against dataset mean ({:.2})", mean)),
        )
    }
}

pub struct UniformityRule;

impl Rule for UniformityRule {
    fn kind(&self) -> InsightKind {
        InsightKind::Uniformity
    }

    fn name(&self) -> &'static str {
        "Uniformity"
    }

    fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Option<Insight> {
        if !ctx.has_group_signal() {
            return None;
        }

        let n = ctx.groups.len() as f64;
        let mu = ctx.groups.iter().map(|g| g.value).sum::<f64>() / n;
        let variance = ctx
            .groups
            .iter()
            .map(|g| (g.value - mu).powi(2))
            .sum::<f64>()
            / n;
        let sigma = if variance.is_finite() {
            variance.sqrt()
        } else {
            0.0
        };

        if sigma >= mu * ctx.thresholds.uniformity_cv {
            return None;
        }

        Some(Insight::new(
            self.kind(),
            Severity::Low,
            "Group values show unusually uniform distribution",
        ))
    }
}

pub struct ZeroActivityRule;

impl Rule for ZeroActivityRule {
    fn kind(&self) -> InsightKind {
        InsightKind::ZeroActivity
    }

    fn name(&self) -> &'static str {
        "Zero Activity"
    }

    fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Option<Insight> {
        if !ctx.has_group_signal() {
            return None;
        }

        let zeros = ctx.groups.iter().filter(|g| g.value == 0.0).count();
        if zeros == 0 {
            return None;
        }

        let severity =
            if zeros as f64 > ctx.groups.len() as f64 * ctx.thresholds.zero_medium_share {
                Severity::Medium
            } else {
                Severity::Low
            };

        Some(Insight::new(
            self.kind(),
            severity,
            format!("{} {} show zero activity", zeros, ctx.group_label()),
        ))
    }
}

pub struct DemographicSkewRule;

impl DemographicSkewRule {
    fn applies_to(field: &str, pattern: &str) -> bool {
        field.to_lowercase().contains(&pattern.to_lowercase())
    }
}

impl Rule for DemographicSkewRule {
    fn kind(&self) -> InsightKind {
        InsightKind::DemographicSkew
    }

    fn name(&self) -> &'static str {
        "Demographic Skew"
    }

    fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Option<Insight> {
        if !ctx.has_group_signal() {
            return None;
        }
        let t = ctx.thresholds;

        let field = ctx.group_by_field?;
        if !Self::applies_to(field, &t.skew_field_pattern) {
            return None;
        }

        let top = ctx.ranked.first()?;
        let tail = ctx.ranked.last()?;
        let floor = tail.value.max(1.0);

        if top.value <= t.skew_ratio * floor {
            return None;
        }

        Some(Insight::new(
            self.kind(),
            Severity::Medium,
            format!(
                "{} shows {:.1}× higher activity than {}",
                top.key,
                top.value / floor,
                tail.key
            ),
        ))
    }
}
