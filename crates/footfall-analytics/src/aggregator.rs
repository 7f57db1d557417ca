//! Hourly and brand aggregations over a subset of weekly records

use footfall_common::PatternRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Hour buckets in a histogram.
pub const HOURS_PER_DAY: usize = 24;

/// Brands kept in a co-visitation summary unless configured otherwise.
pub const DEFAULT_BRAND_LIMIT: usize = 20;

/// Total visits in one hour of the day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyVisitTotal {
    /// Hour of day, 0..=23
    pub hour: u8,
    /// Visits summed over every selected record
    pub visits: u64,
}

/// Visits to a brand by customers of the selected places on the same day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandCoVisit {
    /// Brand name
    pub brand: String,
    /// Co-visitation count summed over every selected record
    pub visits: u64,
}

/// Trait for reducing weekly records into summary rows
pub trait PatternAggregator<T> {
    /// Aggregate the given records
    fn aggregate<'a, I>(&self, records: I) -> Vec<T>
    where
        I: IntoIterator<Item = &'a PatternRecord>;
}

/// Sums hourly entries positionally into 24 buckets
#[derive(Debug, Default, Clone, Copy)]
pub struct HourlyHistogramAggregator;

impl HourlyHistogramAggregator {
    /// Create a new histogram aggregator
    pub const fn new() -> Self {
        Self
    }
}

impl PatternAggregator<HourlyVisitTotal> for HourlyHistogramAggregator {
    /// Entry `i` of every record adds to hour `i % 24`. All 24 hours are
    /// returned, busiest first; equal totals keep ascending hour order.
    #[instrument(skip_all)]
    fn aggregate<'a, I>(&self, records: I) -> Vec<HourlyVisitTotal>
    where
        I: IntoIterator<Item = &'a PatternRecord>,
    {
        let mut totals = [0u64; HOURS_PER_DAY];
        let mut record_count = 0usize;

        for record in records {
            record_count += 1;
            for (index, entry) in record.visits_by_each_hour.iter().enumerate() {
                let bucket = &mut totals[index % HOURS_PER_DAY];
                *bucket = bucket.saturating_add(entry.visits);
            }
        }

        let mut result: Vec<HourlyVisitTotal> = (0u8..)
            .zip(totals)
            .map(|(hour, visits)| HourlyVisitTotal { hour, visits })
            .collect();

        result.sort_by(|a, b| b.visits.cmp(&a.visits));

        debug!("Aggregated hourly histogram over {} records", record_count);
        result
    }
}

/// Accumulates related same-day brand counts and keeps the top entries
#[derive(Debug, Clone, Copy)]
pub struct BrandCoVisitAggregator {
    /// Maximum number of brands to return
    pub limit: usize,
}

impl Default for BrandCoVisitAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl BrandCoVisitAggregator {
    /// Create an aggregator keeping the top 20 brands
    pub const fn new() -> Self {
        Self {
            limit: DEFAULT_BRAND_LIMIT,
        }
    }

    /// Create an aggregator keeping the top `limit` brands
    pub const fn with_limit(limit: usize) -> Self {
        Self { limit }
    }
}

impl PatternAggregator<BrandCoVisit> for BrandCoVisitAggregator {
    /// Sorted by total descending, then brand name ascending.
    #[instrument(skip_all, fields(limit = self.limit))]
    fn aggregate<'a, I>(&self, records: I) -> Vec<BrandCoVisit>
    where
        I: IntoIterator<Item = &'a PatternRecord>,
    {
        let mut brand_counts: HashMap<&'a str, u64> = HashMap::new();

        for record in records {
            for (brand, count) in &record.related_same_day_brand {
                let total = brand_counts.entry(brand.as_str()).or_insert(0);
                *total = total.saturating_add(*count);
            }
        }

        let distinct = brand_counts.len();
        let mut result: Vec<BrandCoVisit> = brand_counts
            .into_iter()
            .map(|(brand, visits)| BrandCoVisit {
                brand: brand.to_string(),
                visits,
            })
            .collect();

        result.sort_by(|a, b| b.visits.cmp(&a.visits).then_with(|| a.brand.cmp(&b.brand)));
        result.truncate(self.limit);

        debug!(
            "Aggregated {} of {} co-visited brands",
            result.len(),
            distinct
        );
        result
    }
}

/// Hourly visit histogram over `records`; see [`HourlyHistogramAggregator`].
pub fn hourly_histogram<'a, I>(records: I) -> Vec<HourlyVisitTotal>
where
    I: IntoIterator<Item = &'a PatternRecord>,
{
    HourlyHistogramAggregator::new().aggregate(records)
}

/// Top `limit` co-visited brands over `records`.
pub fn brand_covisit_summary<'a, I>(records: I, limit: usize) -> Vec<BrandCoVisit>
where
    I: IntoIterator<Item = &'a PatternRecord>,
{
    BrandCoVisitAggregator::with_limit(limit).aggregate(records)
}
