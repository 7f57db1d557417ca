//! Per-credential cache of run outputs

use crate::output::PipelineOutput;
use footfall_common::{ApiKey, FootfallError, Result};
use footfall_config::CacheConfig;
use moka::future::Cache;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Cache performance counters
#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

impl CacheMetrics {
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_invalidations(&self, count: u64) {
        self.invalidations.fetch_add(count, Ordering::Relaxed);
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`CacheMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups that required a run
    pub misses: u64,
    /// Entries dropped by explicit invalidation
    pub invalidations: u64,
}

impl CacheStats {
    /// Share of lookups served from the cache
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        }
    }
}

/// Run outputs keyed by credential, expiring after a TTL
#[derive(Clone)]
pub struct ResultCache {
    cache: Cache<ApiKey, Arc<PipelineOutput>>,
    metrics: Arc<CacheMetrics>,
}

impl ResultCache {
    /// Create a cache from the cache section of the configuration
    pub fn new(config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(Duration::from_secs(config.ttl_secs))
            .build();

        Self {
            cache,
            metrics: Arc::new(CacheMetrics::default()),
        }
    }

    /// Output cached for `api_key`, if still valid
    #[instrument(skip_all)]
    pub async fn get(&self, api_key: &ApiKey) -> Option<Arc<PipelineOutput>> {
        if let Some(output) = self.cache.get(api_key).await {
            debug!("Cache hit for run {}", output.run_id);
            self.metrics.record_hit();
            Some(output)
        } else {
            debug!("Cache miss");
            self.metrics.record_miss();
            None
        }
    }

    /// Output cached for `api_key`, or the output of `init` once it succeeds.
    ///
    /// Concurrent callers for the same key share one `init`. Its error is
    /// handed to every waiter and nothing is stored.
    #[instrument(skip_all)]
    pub async fn get_or_try_insert_with<F>(
        &self,
        api_key: &ApiKey,
        init: F,
    ) -> Result<Arc<PipelineOutput>>
    where
        F: Future<Output = Result<Arc<PipelineOutput>>>,
    {
        if let Some(output) = self.get(api_key).await {
            return Ok(output);
        }

        self.cache
            .try_get_with(api_key.clone(), init)
            .await
            .map_err(FootfallError::from)
    }

    /// Store the output of a run for `api_key`
    #[instrument(skip_all, fields(run_id = %output.run_id))]
    pub async fn insert(&self, api_key: ApiKey, output: Arc<PipelineOutput>) {
        self.cache.insert(api_key, output).await;
    }

    /// Drop the output cached for `api_key`
    #[instrument(skip_all)]
    pub async fn invalidate(&self, api_key: &ApiKey) {
        if self.cache.remove(api_key).await.is_some() {
            self.metrics.record_invalidations(1);
            info!("Invalidated cached run for credential");
        }
    }

    /// Drop every cached output
    #[instrument(skip_all)]
    pub async fn invalidate_all(&self) {
        self.cache.run_pending_tasks().await;
        let entry_count = self.cache.entry_count();
        self.cache.invalidate_all();
        self.metrics.record_invalidations(entry_count);
        info!("Invalidated {} cached runs", entry_count);
    }

    /// Cache metrics
    pub fn metrics(&self) -> Arc<CacheMetrics> {
        Arc::clone(&self.metrics)
    }
}
