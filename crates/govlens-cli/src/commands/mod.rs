//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `forecast` - Linear-trend forecast with rolling average and highlights
//! - `insights` - Insight rule battery over grouped and time-series rows
//! - `thresholds` - Effective threshold configuration

pub mod forecast;
pub mod insights;
pub mod thresholds;

// Re-export command functions for main.rs
pub use forecast::*;
pub use insights::*;
pub use thresholds::*;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use govlens_core::rows::parse_rows_json;
use govlens_core::AggregateRow;

/// Read a JSON array of aggregate rows from disk
pub fn load_rows(path: &Path) -> Result<Vec<AggregateRow>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let rows = parse_rows_json(&content)
        .with_context(|| format!("Failed to parse rows from {}", path.display()))?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "Loaded aggregate rows");
    Ok(rows)
}

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
