//! Test utilities and record fixtures shared across the workspace.
//!
//! Enabled for this crate's own tests and, through the `testing` feature,
//! for the tests of downstream crates.

use crate::types::{HourlyVisits, Place, PatternRecord, Placekey};
use std::collections::BTreeMap;
use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialize logging for tests. Safe to call from every test.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// A place with a name and fixed coordinates.
pub fn place(placekey: &str, name: &str) -> Place {
    Place {
        placekey: Placekey::from(placekey),
        location_name: Some(name.to_string()),
        street_address: Some("1 Main St".to_string()),
        latitude: Some(43.8260),
        longitude: Some(-111.7897),
    }
}

/// A weekly record with visits only; no hourly or brand data.
pub fn pattern(placekey: &str, week_start: &str, raw_visit_counts: u64) -> PatternRecord {
    PatternRecord {
        placekey: Placekey::from(placekey),
        location_name: Some(format!("Place {placekey}")),
        date_range_start: Some(format!("{week_start}T00:00:00-07:00")),
        raw_visit_counts,
        median_dwell: None,
        distance_from_home: None,
        visits_by_each_hour: Vec::new(),
        bucketed_dwell_times: BTreeMap::new(),
        related_same_day_brand: BTreeMap::new(),
    }
}

/// Replaces the hourly entries of a record, in positional order.
pub fn with_hours(mut record: PatternRecord, hours: &[u64]) -> PatternRecord {
    record.visits_by_each_hour = hours
        .iter()
        .map(|&visits| HourlyVisits { visits })
        .collect();
    record
}

/// Replaces the related-brand map of a record.
pub fn with_brands(mut record: PatternRecord, brands: &[(&str, u64)]) -> PatternRecord {
    record.related_same_day_brand = brands
        .iter()
        .map(|(name, count)| ((*name).to_string(), *count))
        .collect();
    record
}

/// Sets dwell (minutes) and distance from home (meters).
pub fn with_dwell_and_distance(
    mut record: PatternRecord,
    median_dwell: Option<f64>,
    distance_from_home: Option<f64>,
) -> PatternRecord {
    record.median_dwell = median_dwell;
    record.distance_from_home = distance_from_home;
    record
}

/// Assert that two floating point numbers are approximately equal within a tolerance.
pub fn assert_approx_eq(left: f64, right: f64, tolerance: f64) {
    let diff = (left - right).abs();
    assert!(
        diff <= tolerance,
        "assertion failed: `{left}` is not approximately equal to `{right}` (tolerance: {tolerance}, diff: {diff})"
    );
}
