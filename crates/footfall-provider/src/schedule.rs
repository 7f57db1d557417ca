//! Weekly period schedule and the driver that queries each period.

use crate::executor::{PaginationLimits, QueryExecutor};
use crate::normalizer::RecordNormalizer;
use crate::queries::{QueryDocument, PLACES_BY_REGION, WEEKLY_PATTERNS_BY_REGION};
use crate::transport::QueryTransport;
use chrono::{Datelike, Days, NaiveDate, Utc, Weekday};
use footfall_common::{format_query_date, ApiKey, FootfallError, PatternRecord, Place, Result};
use footfall_config::{Config, RangeConfig, RegionConfig};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Join key carried by both places and weekly records.
const PLACEKEY_FIELD: &str = "placekey";

/// Period boundaries between two dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklySchedule {
    /// First day of the range
    pub start: NaiveDate,
    /// Last day of the range, inclusive
    pub end: NaiveDate,
    /// Weekday marking a period boundary
    pub anchor: Weekday,
}

impl WeeklySchedule {
    /// Schedule with Sunday boundaries.
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            anchor: Weekday::Sun,
        }
    }

    /// Schedule from the range section; a missing end date means today (UTC).
    pub fn from_config(range: &RangeConfig) -> Self {
        Self {
            start: range.start_date,
            end: range
                .end_date
                .unwrap_or_else(|| Utc::now().date_naive()),
            anchor: range.anchor,
        }
    }

    /// Every anchor weekday in `[start, end]`, ascending.
    pub fn periods(&self) -> Vec<NaiveDate> {
        let offset = (7 + self.anchor.num_days_from_monday()
            - self.start.weekday().num_days_from_monday())
            % 7;

        let end = self.end;
        std::iter::successors(
            self.start.checked_add_days(Days::new(u64::from(offset))),
            |day| day.checked_add_days(Days::new(7)),
        )
        .take_while(|day| *day <= end)
        .collect()
    }
}

/// Weekly records gathered over a schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternCollection {
    /// Records in chronological period order
    pub records: Vec<PatternRecord>,
    /// Periods skipped because their response was malformed
    pub skipped_periods: Vec<NaiveDate>,
}

/// Issues the places query and one weekly patterns query per period.
pub struct TimeRangeDriver<T: ?Sized> {
    executor: QueryExecutor<T>,
    region: RegionConfig,
    skip_malformed_periods: bool,
}

impl<T: QueryTransport + ?Sized> TimeRangeDriver<T> {
    /// Driver over `transport` using the region, pagination and period
    /// policy from `config`.
    pub fn new(transport: Arc<T>, config: &Config) -> Self {
        Self {
            executor: QueryExecutor::new(transport, PaginationLimits::from(&config.provider)),
            region: config.region.clone(),
            skip_malformed_periods: config.range.skip_malformed_periods,
        }
    }

    fn region_variables(&self) -> Map<String, Value> {
        let mut variables = Map::new();
        variables.insert("city".to_string(), json!(self.region.city));
        variables.insert("region".to_string(), json!(self.region.region));
        variables
    }

    async fn fetch<R: serde::de::DeserializeOwned>(
        &self,
        credential: &ApiKey,
        document: &QueryDocument,
        variables: Map<String, Value>,
    ) -> Result<Vec<R>> {
        let nodes = self
            .executor
            .fetch_all(credential, document, variables)
            .await?;
        RecordNormalizer::new(document.node_field)
            .keyed_by(PLACEKEY_FIELD)
            .normalize(nodes)
    }

    /// Core metadata of every place in the region.
    #[instrument(skip(self, credential), fields(city = %self.region.city, region = %self.region.region))]
    pub async fn fetch_places(&self, credential: &ApiKey) -> Result<Vec<Place>> {
        let places: Vec<Place> = self
            .fetch(credential, &PLACES_BY_REGION, self.region_variables())
            .await?;
        info!("Fetched {} places", places.len());
        Ok(places)
    }

    /// Weekly records of the week starting on `period`.
    #[instrument(skip(self, credential))]
    pub async fn fetch_period(
        &self,
        credential: &ApiKey,
        period: NaiveDate,
    ) -> Result<Vec<PatternRecord>> {
        let mut variables = self.region_variables();
        variables.insert("date".to_string(), json!(format_query_date(period)));
        self.fetch(credential, &WEEKLY_PATTERNS_BY_REGION, variables)
            .await
    }

    /// Runs one query per period, in order, and concatenates the records.
    ///
    /// Transport and auth failures abort. A malformed period aborts unless
    /// skipping is enabled, in which case it is logged and reported.
    #[instrument(skip(self, credential, schedule), fields(start = %schedule.start, end = %schedule.end))]
    pub async fn collect_patterns(
        &self,
        credential: &ApiKey,
        schedule: &WeeklySchedule,
    ) -> Result<PatternCollection> {
        let periods = schedule.periods();
        info!("Collecting weekly patterns for {} periods", periods.len());

        let mut batches = Vec::with_capacity(periods.len());
        let mut skipped_periods = Vec::new();

        for period in periods {
            match self.fetch_period(credential, period).await {
                Ok(records) => {
                    debug!("Period {} returned {} records", period, records.len());
                    batches.push(records);
                }
                Err(e @ FootfallError::MalformedResponse { .. }) if self.skip_malformed_periods => {
                    warn!("Skipping period {}: {}", period, e);
                    skipped_periods.push(period);
                }
                Err(e) => return Err(e),
            }
        }

        let records: Vec<PatternRecord> = batches.into_iter().flatten().collect();
        info!(
            "Collected {} weekly records ({} periods skipped)",
            records.len(),
            skipped_periods.len()
        );
        Ok(PatternCollection {
            records,
            skipped_periods,
        })
    }
}
