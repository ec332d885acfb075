//! Operational spike/drop rule
//!
//! Compares the latest period-on-period change with the average change over
//! the whole series. Requires at least `spike_min_points` points.

use super::engine::{AnalysisContext, Rule};
use super::types::{Insight, InsightKind, Severity};

pub struct SpikeDropRule;

impl Rule for SpikeDropRule {
    fn kind(&self) -> InsightKind {
        InsightKind::SpikeDrop
    }

    fn name(&self) -> &'static str {
        "Spike/Drop"
    }

    fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Option<Insight> {
        let t = ctx.thresholds;
        let series = &ctx.series;
        if series.len() < t.spike_min_points.max(2) {
            return None;
        }

        let n = series.len();
        let delta = series[n - 1].value - series[n - 2].value;
        let avg_delta = series
            .windows(2)
            .map(|w| w[1].value - w[0].value)
            .sum::<f64>()
            / (n - 1) as f64;

        if delta.abs() <= t.spike_multiplier * avg_delta.abs() {
            return None;
        }

        let direction = if delta > 0.0 { "spike" } else { "drop" };

        Some(
            Insight::new(
                self.kind(),
                Severity::Medium,
                format!(
                    "Recent period shows {} of {:.0} vs average change {:.0}",
                    direction,
                    delta.abs(),
                    avg_delta
                ),
            )
            .with_reason(format!(
                "Change exceeds {}× average period-on-period change",
                t.spike_multiplier
            )),
        )
    }
}
