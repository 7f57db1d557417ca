//! Run orchestration.

use crate::cache::ResultCache;
use crate::output::PipelineOutput;
use chrono::Utc;
use footfall_analytics::{join_visit_totals, SelectionReport};
use footfall_common::{ApiKey, FootfallError, Placekey, Result};
use footfall_config::Config;
use footfall_provider::{ProviderClient, QueryTransport, TimeRangeDriver, WeeklySchedule};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Fetches, joins and caches run outputs for a provider transport.
pub struct Pipeline<T: ?Sized> {
    config: Arc<Config>,
    transport: Arc<T>,
    cache: ResultCache,
}

impl Pipeline<ProviderClient> {
    /// Pipeline talking to the configured HTTP endpoint.
    pub fn from_config(config: Config) -> Result<Self> {
        let client = ProviderClient::new(&config.provider)?;
        Ok(Self::new(config, Arc::new(client)))
    }
}

impl<T: QueryTransport + ?Sized> Pipeline<T> {
    /// Pipeline over an arbitrary transport.
    pub fn new(config: Config, transport: Arc<T>) -> Self {
        let cache = ResultCache::new(&config.cache);
        Self {
            config: Arc::new(config),
            transport,
            cache,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The per-credential output cache.
    pub const fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Output for `api_key`, from the cache when a previous run is still
    /// valid. Concurrent calls for one key share a single run, and failed
    /// runs are never cached.
    #[instrument(skip_all)]
    pub async fn run_pipeline(&self, api_key: &ApiKey) -> Result<Arc<PipelineOutput>> {
        self.cache
            .get_or_try_insert_with(api_key, async {
                self.run_uncached(api_key).await.map(Arc::new)
            })
            .await
    }

    /// Runs every query for `api_key`, bypassing the cache.
    #[instrument(skip_all, fields(run_id = tracing::field::Empty))]
    pub async fn run_uncached(&self, api_key: &ApiKey) -> Result<PipelineOutput> {
        if api_key.is_blank() {
            return Err(FootfallError::auth("An API key is required"));
        }

        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));

        let schedule = WeeklySchedule::from_config(&self.config.range);
        let driver = TimeRangeDriver::new(Arc::clone(&self.transport), &self.config);
        info!(
            "Starting run for {}, {} from {} to {}",
            self.config.region.city, self.config.region.region, schedule.start, schedule.end
        );

        let places = driver.fetch_places(api_key).await?;
        let collection = driver.collect_patterns(api_key, &schedule).await?;

        let known: HashSet<&Placekey> = places.iter().map(|p| &p.placekey).collect();
        let fetched = collection.records.len();
        let patterns: Vec<_> = collection
            .records
            .into_iter()
            .filter(|record| known.contains(&record.placekey))
            .collect();
        if patterns.len() < fetched {
            debug!(
                "Dropped {} weekly records for places outside the places table",
                fetched - patterns.len()
            );
        }

        let summaries = join_visit_totals(&places, &patterns);
        info!(
            "Run finished: {} places with visits, {} weekly records",
            summaries.len(),
            patterns.len()
        );

        Ok(PipelineOutput {
            run_id,
            generated_at: Utc::now(),
            places: summaries,
            patterns,
            skipped_periods: collection.skipped_periods,
        })
    }

    /// Selection report using the configured brand limit.
    pub fn analyze_selection(
        &self,
        output: &PipelineOutput,
        placekeys: &[Placekey],
    ) -> SelectionReport {
        analyze_selection(output, placekeys, self.config.analysis.brand_limit)
    }
}

/// Selected place rows, weekly series, hourly histogram, insights and top
/// co-visited brands for `placekeys`.
pub fn analyze_selection(
    output: &PipelineOutput,
    placekeys: &[Placekey],
    brand_limit: usize,
) -> SelectionReport {
    SelectionReport::build(&output.places, &output.patterns, placekeys, brand_limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use footfall_common::test_utils::{pattern, place, with_hours};
    use footfall_provider::testing::{results_page, FakeProvider};
    use footfall_provider::{GraphQlRequest, PLACES_BY_REGION, WEEKLY_PATTERNS_BY_REGION};
    use serde_json::Value;
    use std::time::Duration;

    /// Delays every request so overlapping runs are observable.
    struct SlowProvider(FakeProvider);

    #[async_trait]
    impl QueryTransport for SlowProvider {
        async fn execute(&self, credential: &ApiKey, request: &GraphQlRequest) -> Result<Value> {
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.0.execute(credential, request).await
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.range.end_date = NaiveDate::from_ymd_opt(2022, 1, 15);
        config
    }

    #[tokio::test]
    async fn test_blank_key_is_rejected_without_requests() {
        let fake = Arc::new(FakeProvider::with_data(Vec::new(), Vec::new()));
        let pipeline = Pipeline::new(config(), Arc::clone(&fake));

        let err = pipeline.run_pipeline(&ApiKey::new(" ")).await.unwrap_err();
        assert!(err.is_auth());
        assert!(fake.requests().is_empty());
    }

    #[tokio::test]
    async fn test_patterns_for_unknown_places_are_dropped() {
        let fake = Arc::new(FakeProvider::with_data(
            vec![place("a", "A")],
            vec![
                pattern("a", "2022-01-02", 3),
                pattern("ghost", "2022-01-02", 50),
            ],
        ));
        let pipeline = Pipeline::new(config(), fake);

        let output = pipeline.run_uncached(&ApiKey::new("k")).await.unwrap();
        assert_eq!(output.patterns.len(), 1);
        assert_eq!(output.places.len(), 1);
        assert_eq!(output.places[0].raw_visit_counts, 3);
    }

    #[tokio::test]
    async fn test_patterns_without_placekey_are_dropped() {
        let fake = Arc::new(FakeProvider::with_handler(|request| {
            if request.operation_name == PLACES_BY_REGION.operation_name {
                return Ok(results_page(
                    &[place("abc", "ABC")],
                    PLACES_BY_REGION.node_field,
                    false,
                    None,
                ));
            }
            let keyed = serde_json::to_value(pattern("abc", "2022-01-02", 5))?;
            let mut unkeyed = keyed.clone();
            unkeyed["placekey"] = Value::Null;
            Ok(results_page(
                &[keyed, unkeyed],
                WEEKLY_PATTERNS_BY_REGION.node_field,
                false,
                None,
            ))
        }));
        let mut config = config();
        config.range.end_date = NaiveDate::from_ymd_opt(2022, 1, 8);
        let pipeline = Pipeline::new(config, fake);

        let output = pipeline.run_pipeline(&ApiKey::new("k")).await.unwrap();
        assert_eq!(output.patterns.len(), 1);
        assert_eq!(output.places.len(), 1);
        assert_eq!(output.places[0].raw_visit_counts, 5);
    }

    #[tokio::test]
    async fn test_concurrent_runs_for_one_key_share_requests() {
        let slow = Arc::new(SlowProvider(FakeProvider::with_data(
            vec![place("a", "A")],
            vec![pattern("a", "2022-01-02", 3)],
        )));
        let pipeline = Pipeline::new(config(), Arc::clone(&slow));
        let key = ApiKey::new("k");

        let (first, second) = tokio::join!(pipeline.run_pipeline(&key), pipeline.run_pipeline(&key));
        assert!(Arc::ptr_eq(&first.unwrap(), &second.unwrap()));
        // One places query and one query per Sunday in the range.
        assert_eq!(slow.0.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_analyze_selection_uses_configured_limit() {
        let fake = Arc::new(FakeProvider::with_data(
            vec![place("a", "A")],
            vec![with_hours(pattern("a", "2022-01-09", 3), &[2])],
        ));
        let mut config = config();
        config.analysis.brand_limit = 1;
        let pipeline = Pipeline::new(config, fake);

        let output = pipeline.run_pipeline(&ApiKey::new("k")).await.unwrap();
        let report = pipeline.analyze_selection(&output, &[Placekey::from("a")]);
        assert_eq!(report.places.len(), 1);
        assert_eq!(report.hourly[0].visits, 2);
    }
}
