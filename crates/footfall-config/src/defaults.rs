//! Default values for every configuration section.

use crate::schema::*;
use chrono::{NaiveDate, Weekday};
use footfall_common::LoggingConfig;

/// Public GraphQL endpoint of the places data provider.
pub const DEFAULT_PROVIDER_URL: &str = "https://api.safegraph.com/v2/graphql";

/// Largest page the provider serves.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Number of brands shown in the co-visitation summary.
pub const DEFAULT_BRAND_LIMIT: usize = 20;

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            region: RegionConfig::default(),
            range: RangeConfig::default(),
            analysis: AnalysisConfig::default(),
            cache: CacheConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PROVIDER_URL.to_string(),
            api_key: None,
            timeout_secs: 30,
            max_idle_per_host: 10,
            rate_limit_per_sec: 10,
            max_retries: 3,
            page_size: MAX_PAGE_SIZE,
            max_pages: None,
            max_records: None,
        }
    }
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            city: "Rexburg".to_string(),
            region: "ID".to_string(),
        }
    }
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap_or_default(),
            end_date: None,
            anchor: Weekday::Sun,
            skip_malformed_periods: false,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            brand_limit: DEFAULT_BRAND_LIMIT,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 16,
            ttl_secs: 6 * 60 * 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_target_region() {
        let config = Config::default();
        assert_eq!(config.region.city, "Rexburg");
        assert_eq!(config.region.region, "ID");
        assert_eq!(
            config.range.start_date,
            NaiveDate::from_ymd_opt(2022, 1, 1).unwrap()
        );
        assert_eq!(config.range.anchor, Weekday::Sun);
        assert_eq!(config.provider.page_size, 500);
        assert!(config.provider.max_pages.is_none());
        assert_eq!(config.analysis.brand_limit, 20);
    }
}
