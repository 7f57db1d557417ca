//! Integration tests for footfall-analytics crate.

use footfall_analytics::{
    hourly_histogram, join_visit_totals, select_patterns, HourlyVisitTotal, SelectionReport,
};
use footfall_common::test_utils::{pattern, place, with_hours};
use footfall_common::Placekey;

#[test]
fn test_join_then_select() {
    let places = vec![place("abc", "Broulim's"), place("def", "Maverik")];
    let patterns = vec![
        with_hours(pattern("abc", "2022-01-02", 10), &[1, 1]),
        with_hours(pattern("abc", "2022-01-09", 25), &[0, 4]),
        with_hours(pattern("def", "2022-01-02", 7), &[3]),
    ];

    let summaries = join_visit_totals(&places, &patterns);
    assert_eq!(summaries[0].raw_visit_counts, 35);
    assert_eq!(summaries[1].raw_visit_counts, 7);

    let selection = vec![Placekey::from("abc")];
    let selected = select_patterns(&patterns, &selection);
    let histogram = hourly_histogram(selected.iter().copied());
    assert_eq!(histogram[0], HourlyVisitTotal { hour: 1, visits: 5 });
    assert_eq!(histogram[1], HourlyVisitTotal { hour: 0, visits: 1 });

    let report = SelectionReport::build(&summaries, &patterns, &selection, 20);
    assert_eq!(report.places.len(), 1);
    assert_eq!(report.weekly_series.len(), 2);
    assert_eq!(report.hourly, histogram);
}

#[test]
fn test_report_serializes() {
    let report = SelectionReport::build(&[], &[], &[], 20);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["hourly"].as_array().unwrap().len(), 24);
    assert!(json["insights"]["mean_median_dwell_minutes"].is_null());
}
