//! Insights command implementation

use std::path::Path;

use anyhow::Result;
use govlens_core::{AnalysisContext, Insight, InsightEngine, InsightRequest, Severity, Thresholds};
use serde::Serialize;

use super::load_rows;
use crate::cli::OutputFormat;

/// Paths and labels for one insights run
pub struct InsightInputs<'a> {
    pub groups: Option<&'a Path>,
    pub trends: Option<&'a Path>,
    pub dataset: &'a str,
    pub metric: Option<&'a str>,
    pub group_by: Option<&'a str>,
    /// Field holding the period label in trend rows
    pub period_field: &'a str,
}

#[derive(Debug, Serialize)]
pub struct InsightsReport {
    pub dataset: String,
    pub context: String,
    pub insights: Vec<Insight>,
}

/// Load the requested rows into an engine request
pub fn build_request(inputs: &InsightInputs<'_>) -> Result<InsightRequest> {
    let mut request = InsightRequest::new(inputs.dataset).with_period_field(inputs.period_field);
    if let Some(metric) = inputs.metric {
        request = request.with_metric(metric);
    }
    if let Some(group_by) = inputs.group_by {
        request = request.with_group_by(group_by);
    }
    if let Some(path) = inputs.groups {
        request = request.with_group_rows(load_rows(path)?);
    }
    if let Some(path) = inputs.trends {
        request = request.with_trends(load_rows(path)?);
    }
    Ok(request)
}

pub fn build_report(engine: &InsightEngine, request: &InsightRequest) -> InsightsReport {
    let ctx = AnalysisContext::from_request(request, engine.thresholds());
    InsightsReport {
        dataset: request.dataset_name.clone(),
        context: ctx.describe(),
        insights: engine.analyze(&ctx),
    }
}

pub fn cmd_insights(
    thresholds: Thresholds,
    inputs: InsightInputs<'_>,
    format: OutputFormat,
) -> Result<()> {
    if inputs.groups.is_none() && inputs.trends.is_none() {
        anyhow::bail!("Provide --groups and/or --trends");
    }

    let request = build_request(&inputs)?;
    let engine = InsightEngine::with_thresholds(thresholds);
    let report = build_report(&engine, &request);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", render_insights(&report)),
    }

    Ok(())
}

fn severity_icon(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "🔴",
        Severity::Medium => "🟠",
        Severity::Low => "🟢",
    }
}

pub fn render_insights(report: &InsightsReport) -> String {
    let mut out = String::new();

    out.push('\n');
    out.push_str(&format!("💡 Insights for {}\n", report.dataset));
    out.push_str("   ─────────────────────────────────────────────────────────────\n");

    if report.insights.is_empty() {
        out.push_str(
            "   No insights generated for current selection. Adjust metric or grouping.\n",
        );
        return out;
    }

    for insight in &report.insights {
        out.push_str(&format!(
            "   {} [{}] {}\n",
            severity_icon(insight.severity),
            insight.severity,
            insight.title
        ));
        out.push_str(&format!("      {}\n", insight.insight));
        out.push_str(&format!("      Recommendation: {}\n", insight.recommendation));
        out.push_str(&format!("      Reason: {}\n", insight.reason));
        out.push_str(&format!("      Context: {}\n", report.context));
        out.push('\n');
    }

    out
}
