//! Joins place metadata with summed weekly visits.

use footfall_common::{PatternRecord, Place, Placekey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// A place row with its total raw visits over the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitSummary {
    /// Place metadata
    #[serde(flatten)]
    pub place: Place,
    /// Sum of `raw_visit_counts` over every weekly record of the place
    pub raw_visit_counts: u64,
}

/// Sums visits per placekey and inner-joins the totals onto `places`.
///
/// Places without records are dropped, records without a place are ignored,
/// and the output follows the order of `places`.
pub fn join_visit_totals(places: &[Place], patterns: &[PatternRecord]) -> Vec<VisitSummary> {
    let mut totals: HashMap<&Placekey, u64> = HashMap::new();
    for record in patterns {
        let total = totals.entry(&record.placekey).or_insert(0);
        *total = total.saturating_add(record.raw_visit_counts);
    }

    let summaries: Vec<VisitSummary> = places
        .iter()
        .filter_map(|place| {
            totals.get(&place.placekey).map(|&raw_visit_counts| VisitSummary {
                place: place.clone(),
                raw_visit_counts,
            })
        })
        .collect();

    debug!(
        "Joined {} of {} places with visit totals from {} records",
        summaries.len(),
        places.len(),
        patterns.len()
    );
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use footfall_common::test_utils::{pattern, place};

    #[test]
    fn test_visits_summed_per_place() {
        let places = vec![place("abc", "Store")];
        let patterns = vec![pattern("abc", "2022-01-02", 10), pattern("abc", "2022-01-09", 25)];

        let joined = join_visit_totals(&places, &patterns);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].place.placekey.as_str(), "abc");
        assert_eq!(joined[0].raw_visit_counts, 35);
    }

    #[test]
    fn test_inner_join_drops_unmatched() {
        let places = vec![place("b", "B"), place("a", "A"), place("z", "No records")];
        let patterns = vec![
            pattern("a", "2022-01-02", 1),
            pattern("b", "2022-01-02", 2),
            pattern("orphan", "2022-01-02", 99),
        ];

        let joined = join_visit_totals(&places, &patterns);
        let keys: Vec<&str> = joined.iter().map(|s| s.place.placekey.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_zero_visit_records_still_join() {
        let places = vec![place("a", "A")];
        let joined = join_visit_totals(&places, &[pattern("a", "2022-01-02", 0)]);
        assert_eq!(joined[0].raw_visit_counts, 0);
    }

    #[test]
    fn test_summary_serializes_flat() {
        let joined = join_visit_totals(&[place("a", "A")], &[pattern("a", "2022-01-02", 4)]);
        let value = serde_json::to_value(&joined[0]).unwrap();
        assert_eq!(value["placekey"], "a");
        assert_eq!(value["location_name"], "A");
        assert_eq!(value["raw_visit_counts"], 4);
    }
}
