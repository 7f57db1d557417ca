//! Views over a caller's selection of places.

use crate::aggregator::{brand_covisit_summary, hourly_histogram, BrandCoVisit, HourlyVisitTotal};
use crate::join::VisitSummary;
use chrono::NaiveDate;
use footfall_common::{round_to, PatternRecord, Placekey};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One point of a place's weekly visit line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyVisitPoint {
    /// Place the point belongs to
    pub placekey: Placekey,
    /// First day of the week, when the provider reported it
    pub week_start: Option<NaiveDate>,
    /// Raw visits in that week
    pub raw_visit_counts: u64,
}

/// Dwell and travel averages over a selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationInsights {
    /// Mean of `median_dwell`, in minutes, to two decimals
    pub mean_median_dwell_minutes: Option<f64>,
    /// Mean of `distance_from_home`, in kilometres, to two decimals
    pub mean_distance_from_home_km: Option<f64>,
}

/// Everything shown for a selection of places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionReport {
    /// Selected place rows, in places-table order
    pub places: Vec<VisitSummary>,
    /// Weekly visits per selected place
    pub weekly_series: Vec<WeeklyVisitPoint>,
    /// Hourly histogram over the selected records
    pub hourly: Vec<HourlyVisitTotal>,
    /// Dwell and travel averages
    pub insights: LocationInsights,
    /// Top co-visited brands
    pub brands: Vec<BrandCoVisit>,
}

impl SelectionReport {
    /// Builds the report for `selection` out of a run's two tables.
    ///
    /// Unknown placekeys in `selection` select nothing.
    pub fn build(
        places: &[VisitSummary],
        patterns: &[PatternRecord],
        selection: &[Placekey],
        brand_limit: usize,
    ) -> Self {
        let wanted: HashSet<&Placekey> = selection.iter().collect();
        let selected = select_patterns(patterns, selection);

        Self {
            places: places
                .iter()
                .filter(|summary| wanted.contains(&summary.place.placekey))
                .cloned()
                .collect(),
            weekly_series: weekly_visit_series(selected.iter().copied()),
            hourly: hourly_histogram(selected.iter().copied()),
            insights: location_insights(selected.iter().copied()),
            brands: brand_covisit_summary(selected.iter().copied(), brand_limit),
        }
    }
}

/// Records whose placekey is in `selection`, in their original order.
pub fn select_patterns<'a>(
    patterns: &'a [PatternRecord],
    selection: &[Placekey],
) -> Vec<&'a PatternRecord> {
    let wanted: HashSet<&Placekey> = selection.iter().collect();
    patterns
        .iter()
        .filter(|record| wanted.contains(&record.placekey))
        .collect()
}

/// Weekly visit points ordered by placekey, then week.
pub fn weekly_visit_series<'a, I>(records: I) -> Vec<WeeklyVisitPoint>
where
    I: IntoIterator<Item = &'a PatternRecord>,
{
    let mut series: Vec<WeeklyVisitPoint> = records
        .into_iter()
        .map(|record| WeeklyVisitPoint {
            placekey: record.placekey.clone(),
            week_start: record.week_start(),
            raw_visit_counts: record.raw_visit_counts,
        })
        .collect();
    series.sort_by(|a, b| {
        a.placekey
            .cmp(&b.placekey)
            .then_with(|| a.week_start.cmp(&b.week_start))
    });
    series
}

/// Mean dwell and distance from home, skipping missing values.
pub fn location_insights<'a, I>(records: I) -> LocationInsights
where
    I: IntoIterator<Item = &'a PatternRecord>,
{
    let mut dwell = Mean::default();
    let mut distance = Mean::default();

    for record in records {
        if let Some(minutes) = record.median_dwell {
            dwell.add(minutes);
        }
        if let Some(meters) = record.distance_from_home {
            distance.add(meters);
        }
    }

    LocationInsights {
        mean_median_dwell_minutes: dwell.value().map(|m| round_to(m, 2)),
        mean_distance_from_home_km: distance.value().map(|m| round_to(m / 1000.0, 2)),
    }
}

#[derive(Default)]
struct Mean {
    sum: f64,
    count: u32,
}

impl Mean {
    fn add(&mut self, value: f64) {
        if value.is_finite() {
            self.sum += value;
            self.count += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / f64::from(self.count))
    }
}
