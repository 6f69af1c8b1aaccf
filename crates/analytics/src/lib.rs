//! # Pulse Analytics Engine
//!
//! This crate derives chart series and summary statistics from a hospital's
//! resource and service history.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of the database
//!   or the CLI. It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** The `ResourceAnalyticsEngine` holds nothing but its label
//!   format. Every operation is a function of its explicit inputs, including the reference
//!   instant `now`, so results are deterministic and easy to test.
//!
//! ## Public API
//!
//! - `ResourceAnalyticsEngine`: window selection, chart series and summary statistics.
//! - `AnalysisWindow`: the trailing periods offered to operators (24h, 7, 30, 90 days).
//! - `DerivedSeriesPoint`, `SummaryStatistics`, `ResourceAnalytics`, `ServiceSeriesPoint`:
//!   the computed, non-persisted outputs.
//! - `AnalyticsError`: returned when parsing a window from user input.

pub mod engine;
pub mod error;
pub mod report;
pub mod window;

pub use engine::{
    is_valid_label_format, occupancy_percent, occupancy_rate, ResourceAnalyticsEngine,
    DEFAULT_LABEL_FORMAT,
};
pub use error::AnalyticsError;
pub use report::{DerivedSeriesPoint, ResourceAnalytics, ServiceSeriesPoint, SummaryStatistics};
pub use window::AnalysisWindow;
