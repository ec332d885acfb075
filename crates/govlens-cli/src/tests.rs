//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::io::Write;

use govlens_core::{Horizon, InsightEngine, InsightKind, Severity, Thresholds};
use tempfile::NamedTempFile;

use crate::cli::OutputFormat;
use crate::commands::{self, truncate, ForecastReport, InsightInputs};

fn write_json(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

const TRENDS: &str = r#"[
    {"period": "2024-01", "requests": 10},
    {"period": "2024-02", "requests": 11},
    {"period": "2024-03", "requests": 12},
    {"period": "2024-04", "requests": 13},
    {"period": "2024-05", "requests": 14},
    {"period": "2024-06", "requests": 24}
]"#;

const AGE_GROUPS: &str = r#"[
    {"age_band": "18-24", "requests": 120},
    {"age_band": "25-34", "requests": 60},
    {"age_band": "65+", "requests": 0},
    {"age_band": null, "requests": 999}
]"#;

// ========== Shared Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a very long period label", 10), "a very ...");
}

#[test]
fn test_load_rows() {
    let file = write_json(TRENDS);
    let rows = commands::load_rows(file.path()).unwrap();
    assert_eq!(rows.len(), 6);
}

#[test]
fn test_load_rows_invalid_json() {
    let file = write_json("{not json");
    assert!(commands::load_rows(file.path()).is_err());
}

#[test]
fn test_load_rows_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(commands::load_rows(&dir.path().join("missing.json")).is_err());
}

// ========== Forecast Command Tests ==========

#[test]
fn test_forecast_report() {
    let file = write_json(TRENDS);
    let rows = commands::load_rows(file.path()).unwrap();
    let series = govlens_core::rows::series_from_rows(&rows, "period");

    let report = ForecastReport::build(&series, Horizon::Long, 3, 1.96);
    assert_eq!(report.points.len(), 12);
    assert_eq!(report.rolling.len(), 6);
    assert_eq!(report.points[6].period, "+1");
    assert!(report.fit.slope > 0.0);

    let text = commands::render_forecast(&report);
    assert!(text.contains("Trend highlights"));
    assert!(text.contains("For indicative use only."));
    assert!(text.contains("2024-06: 17.00"));
}

#[test]
fn test_forecast_report_empty_series() {
    let report = ForecastReport::build(&[], Horizon::Short, 3, 1.96);
    assert!(report.is_empty());
    assert_eq!(report.points.len(), 3);
    assert!(commands::render_forecast(&report)
        .contains("Time-based analysis not available for this dataset."));
}

#[test]
fn test_cmd_forecast() {
    let file = write_json(TRENDS);
    let thresholds = Thresholds::default();
    let result = commands::cmd_forecast(
        &thresholds,
        file.path(),
        Horizon::Short,
        None,
        "period",
        OutputFormat::Json,
    );
    assert!(result.is_ok());
}

#[test]
fn test_cmd_forecast_rejects_zero_window() {
    let file = write_json(TRENDS);
    let thresholds = Thresholds::default();
    let result = commands::cmd_forecast(
        &thresholds,
        file.path(),
        Horizon::Short,
        Some(0),
        "period",
        OutputFormat::Text,
    );
    assert!(result.is_err());
}

// ========== Insights Command Tests ==========

#[test]
fn test_build_report_with_groups_and_trends() {
    let groups = write_json(AGE_GROUPS);
    let trends = write_json(TRENDS);
    let inputs = InsightInputs {
        groups: Some(groups.path()),
        trends: Some(trends.path()),
        dataset: "Service Requests",
        metric: Some("requests"),
        group_by: Some("age_band"),
        period_field: "period",
    };

    let request = commands::build_request(&inputs).unwrap();
    let report = commands::build_report(&InsightEngine::new(), &request);

    assert_eq!(report.context, "Metric = requests, Group = age_band");
    let kinds: Vec<InsightKind> = report.insights.iter().map(|i| i.kind).collect();
    assert_eq!(
        kinds,
        vec![
            InsightKind::Concentration,
            InsightKind::Disparity,
            InsightKind::ZeroActivity,
            InsightKind::DemographicSkew,
            InsightKind::SpikeDrop,
        ]
    );
    assert_eq!(report.insights[0].severity, Severity::High);

    let text = commands::render_insights(&report);
    assert!(text.contains("🔴 [high] High Concentration Alert"));
    assert!(text.contains("Context: Metric = requests, Group = age_band"));
}

#[test]
fn test_render_insights_empty_state() {
    let trends = write_json(r#"[{"period": "2024-01", "requests": 5}]"#);
    let inputs = InsightInputs {
        groups: None,
        trends: Some(trends.path()),
        dataset: "Permits",
        metric: None,
        group_by: None,
        period_field: "period",
    };
    let request = commands::build_request(&inputs).unwrap();
    let report = commands::build_report(&InsightEngine::new(), &request);

    assert!(report.insights.is_empty());
    assert!(commands::render_insights(&report)
        .contains("No insights generated for current selection. Adjust metric or grouping."));
}

#[test]
fn test_insights_custom_period_field() {
    let trends = write_json(
        r#"[
        {"month": "Jan", "requests": 10},
        {"month": "Feb", "requests": 11},
        {"month": "Mar", "requests": 12},
        {"month": "Apr", "requests": 13},
        {"month": "May", "requests": 14},
        {"month": "Jun", "requests": 24}
    ]"#,
    );
    let inputs = InsightInputs {
        groups: None,
        trends: Some(trends.path()),
        dataset: "Permits",
        metric: None,
        group_by: None,
        period_field: "month",
    };
    let request = commands::build_request(&inputs).unwrap();
    assert_eq!(request.period_field.as_deref(), Some("month"));

    let report = commands::build_report(&InsightEngine::new(), &request);
    assert_eq!(report.insights.len(), 1);
    assert_eq!(report.insights[0].kind, InsightKind::SpikeDrop);
}

#[test]
fn test_cmd_insights_requires_input() {
    let inputs = InsightInputs {
        groups: None,
        trends: None,
        dataset: "Permits",
        metric: None,
        group_by: None,
        period_field: "period",
    };
    assert!(commands::cmd_insights(Thresholds::default(), inputs, OutputFormat::Text).is_err());
}

#[test]
fn test_cmd_insights_json() {
    let groups = write_json(AGE_GROUPS);
    let inputs = InsightInputs {
        groups: Some(groups.path()),
        trends: None,
        dataset: "Permits",
        metric: None,
        group_by: None,
        period_field: "period",
    };
    assert!(commands::cmd_insights(Thresholds::default(), inputs, OutputFormat::Json).is_ok());
}

// ========== Thresholds Command Tests ==========

#[test]
fn test_cmd_thresholds() {
    let thresholds = Thresholds::default();
    assert!(commands::cmd_thresholds(&thresholds, None).is_ok());
}
