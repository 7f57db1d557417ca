//! # Footfall Analytics
//!
//! Pure aggregations over places and weekly pattern records.
//!
//! Nothing here performs I/O or fails: empty or sparse input yields empty or
//! zero-filled output.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregator;
pub mod join;
pub mod selection;

pub use aggregator::{
    brand_covisit_summary, hourly_histogram, BrandCoVisit, BrandCoVisitAggregator,
    HourlyHistogramAggregator, HourlyVisitTotal, PatternAggregator, DEFAULT_BRAND_LIMIT,
    HOURS_PER_DAY,
};
pub use join::{join_visit_totals, VisitSummary};
pub use selection::{
    location_insights, select_patterns, weekly_visit_series, LocationInsights, SelectionReport,
    WeeklyVisitPoint,
};
