//! Insight Engine - runs the rule battery in a fixed order

use crate::config::Thresholds;
use crate::rows::{
    groups_from_rows, series_from_rows, GroupPoint, TimePoint, DEFAULT_PERIOD_FIELD,
};

use super::distribution::{
    ConcentrationRule, DemographicSkewRule, DisparityRule, UniformityRule, ZeroActivityRule,
};
use super::spike_drop::SpikeDropRule;
use super::types::{Insight, InsightKind, InsightRequest};

/// Normalized inputs shared by every rule in one evaluation
#[derive(Debug, Clone)]
pub struct AnalysisContext<'a> {
    pub dataset_name: &'a str,
    pub metric_field: Option<&'a str>,
    pub group_by_field: Option<&'a str>,
    /// Groups in input order
    pub groups: Vec<GroupPoint>,
    /// Groups sorted by value, largest first (stable)
    pub ranked: Vec<GroupPoint>,
    pub series: Vec<TimePoint>,
    pub thresholds: &'a Thresholds,
}

impl<'a> AnalysisContext<'a> {
    /// Normalize a request's raw rows
    pub fn from_request(request: &'a InsightRequest, thresholds: &'a Thresholds) -> Self {
        let groups = request
            .group_rows
            .as_deref()
            .map(groups_from_rows)
            .unwrap_or_default();
        let period_field = request
            .period_field
            .as_deref()
            .unwrap_or(DEFAULT_PERIOD_FIELD);
        let series = request
            .trends_series
            .as_deref()
            .map(|rows| series_from_rows(rows, period_field))
            .unwrap_or_default();

        Self::new(
            &request.dataset_name,
            request.metric_field.as_deref(),
            request.group_by_field.as_deref(),
            groups,
            series,
            thresholds,
        )
    }

    /// Build a context from already-normalized points
    pub fn new(
        dataset_name: &'a str,
        metric_field: Option<&'a str>,
        group_by_field: Option<&'a str>,
        groups: Vec<GroupPoint>,
        series: Vec<TimePoint>,
        thresholds: &'a Thresholds,
    ) -> Self {
        let mut ranked = groups.clone();
        ranked.sort_by(|a, b| {
            b.value
                .partial_cmp(&a.value)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Self {
            dataset_name,
            metric_field,
            group_by_field,
            groups,
            ranked,
            series,
            thresholds,
        }
    }

    /// Whether there are enough groups for the group rules (never with none)
    pub fn has_group_signal(&self) -> bool {
        !self.groups.is_empty() && self.groups.len() >= self.thresholds.min_groups
    }

    /// Plural noun for groups in narratives
    pub fn group_label(&self) -> &str {
        self.group_by_field.unwrap_or("groups")
    }

    /// Sum of group values, with 0 replaced by 1 so it can be divided by
    pub fn group_total(&self) -> f64 {
        let total: f64 = self.groups.iter().map(|g| g.value).sum();
        if total == 0.0 {
            1.0
        } else {
            total
        }
    }

    /// Context line shown under each finding
    pub fn describe(&self) -> String {
        format!(
            "Metric = {}, Group = {}",
            self.metric_field.unwrap_or("Auto"),
            self.group_by_field.unwrap_or("None")
        )
    }
}

/// A single heuristic check
pub trait Rule: Send + Sync {
    /// Kind of finding this rule emits
    fn kind(&self) -> InsightKind;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Inspect the context; `None` when the rule's precondition or
    /// threshold is not met
    fn evaluate(&self, ctx: &AnalysisContext<'_>) -> Option<Insight>;
}

/// The main insight engine
pub struct InsightEngine {
    rules: Vec<Box<dyn Rule>>,
    thresholds: Thresholds,
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightEngine {
    /// Create an engine with the built-in rules and default thresholds
    pub fn new() -> Self {
        Self::with_thresholds(Thresholds::default())
    }

    /// Create an engine with the built-in rules and custom thresholds
    pub fn with_thresholds(thresholds: Thresholds) -> Self {
        let mut engine = Self {
            rules: vec![],
            thresholds,
        };

        // Registration order is emission order
        engine.register(Box::new(ConcentrationRule));
        engine.register(Box::new(DisparityRule));
        engine.register(Box::new(UniformityRule));
        engine.register(Box::new(ZeroActivityRule));
        engine.register(Box::new(DemographicSkewRule));
        engine.register(Box::new(SpikeDropRule));

        engine
    }

    /// Append a rule; it runs after every rule registered before it
    pub fn register(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Normalize the request and run every rule
    pub fn generate(&self, request: &InsightRequest) -> Vec<Insight> {
        let ctx = AnalysisContext::from_request(request, &self.thresholds);
        self.analyze(&ctx)
    }

    /// Run every rule against a prepared context, in registration order
    pub fn analyze(&self, ctx: &AnalysisContext<'_>) -> Vec<Insight> {
        let mut insights = Vec::new();

        for rule in &self.rules {
            if let Some(insight) = rule.evaluate(ctx) {
                tracing::debug!(
                    rule = rule.name(),
                    kind = rule.kind().as_str(),
                    severity = insight.severity.as_str(),
                    "Insight rule fired"
                );
                insights.push(insight);
            }
        }

        tracing::debug!(
            dataset = ctx.dataset_name,
            groups = ctx.groups.len(),
            points = ctx.series.len(),
            count = insights.len(),
            "Insight analysis complete"
        );

        insights
    }

    /// Registered rule kinds, in evaluation order
    pub fn rule_kinds(&self) -> Vec<InsightKind> {
        self.rules.iter().map(|r| r.kind()).collect()
    }
}

/// Run the built-in rules with default thresholds
pub fn generate_insights(request: &InsightRequest) -> Vec<Insight> {
    InsightEngine::new().generate(request)
}
