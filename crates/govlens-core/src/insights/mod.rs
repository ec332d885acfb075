//! Insight Engine - Heuristic Findings for the Current Selection
//!
//! The Insight Engine inspects the aggregate the user is looking at (a
//! category breakdown and/or a time series) and surfaces what looks
//! concerning or suspicious, each finding with a severity tier.
//!
//! ## Rules
//!
//! Evaluated in this order; any subset may fire:
//!
//! - **Concentration** - a few groups hold most of the total
//! - **Disparity** - groups far below the mean
//! - **Uniformity** - spread too small to be organic
//! - **Zero Activity** - groups reporting nothing
//! - **Demographic Skew** - top vs bottom band when grouped by age
//! - **Spike/Drop** - latest change far above the average change
//!
//! Findings keep that order. They are never re-sorted by severity.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use govlens_core::insights::{generate_insights, InsightRequest};
//!
//! let request = InsightRequest::new("Service Requests")
//!     .with_group_by("district")
//!     .with_group_rows(rows);
//! let findings = generate_insights(&request);
//! ```

pub mod distribution;
pub mod engine;
pub mod spike_drop;
pub mod types;

pub use distribution::{
    ConcentrationRule, DemographicSkewRule, DisparityRule, UniformityRule, ZeroActivityRule,
};
pub use engine::{generate_insights, AnalysisContext, InsightEngine, Rule};
pub use spike_drop::SpikeDropRule;
pub use types::{Insight, InsightKind, InsightRequest, Severity};
