//! Configuration schema definitions using serde.

use chrono::{NaiveDate, Weekday};
use footfall_common::LoggingConfig;
use serde::{Deserialize, Serialize};

/// Main configuration structure for the pipeline.
///
/// Every section falls back to its defaults, so a file only needs the keys
/// it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data provider connection settings.
    pub provider: ProviderConfig,
    /// Region filter applied to both queries.
    pub region: RegionConfig,
    /// Date range walked by the weekly driver.
    pub range: RangeConfig,
    /// Aggregation settings.
    pub analysis: AnalysisConfig,
    /// Per-credential result cache settings.
    pub cache: CacheConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Data provider connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// GraphQL endpoint URL.
    pub url: String,
    /// API key; usually supplied through `FOOTFALL_API_KEY` instead.
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Connection pool max idle connections per host.
    pub max_idle_per_host: usize,
    /// Requests per second allowed against the provider.
    pub rate_limit_per_sec: u32,
    /// Retry attempts for retryable transport failures.
    pub max_retries: usize,
    /// Results requested per page (provider maximum is 500).
    pub page_size: u32,
    /// Stop following cursors after this many pages.
    pub max_pages: Option<u32>,
    /// Stop following cursors once this many nodes were collected.
    pub max_records: Option<usize>,
}

/// Region filter sent as query variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// City name, e.g. "Rexburg".
    pub city: String,
    /// Region (state) code, e.g. "ID".
    pub region: String,
}

/// Date range for the weekly patterns queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeConfig {
    /// First day of the range.
    #[serde(deserialize_with = "config_date::deserialize")]
    pub start_date: NaiveDate,
    /// Last day of the range; today (UTC) when absent.
    #[serde(deserialize_with = "config_date::deserialize_option")]
    pub end_date: Option<NaiveDate>,
    /// Weekday that marks a period boundary.
    #[serde(with = "weekday_name")]
    pub anchor: Weekday,
    /// Skip a week whose response is malformed instead of aborting the run.
    pub skip_malformed_periods: bool,
}

/// Aggregation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Number of brands kept in the co-visitation summary.
    pub brand_limit: usize,
}

/// Result cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of credentials kept.
    pub max_capacity: u64,
    /// Seconds a run output stays valid.
    pub ttl_secs: u64,
}

/// Serializes a weekday as its English name ("Sun", "Monday", ...).
mod weekday_name {
    use chrono::Weekday;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(weekday: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&weekday.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Weekday, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<Weekday>()
            .map_err(|_| D::Error::custom(format!("invalid weekday '{raw}'")))
    }
}

/// Reads a date written either as a `YYYY-MM-DD` string or as a TOML
/// local date (`start_date = 2023-03-01`).
mod config_date {
    use chrono::NaiveDate;
    use serde::de::{self, value::MapAccessDeserializer, Deserialize, Deserializer, MapAccess, Visitor};
    use std::fmt;
    use toml::value::Datetime;

    struct ConfigDate(NaiveDate);

    impl<'de> Deserialize<'de> for ConfigDate {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserializer.deserialize_any(ConfigDateVisitor)
        }
    }

    struct ConfigDateVisitor;

    impl<'de> Visitor<'de> for ConfigDateVisitor {
        type Value = ConfigDate;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a date such as 2022-01-01")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            value
                .trim()
                .parse::<NaiveDate>()
                .map(ConfigDate)
                .map_err(|e| E::custom(format!("invalid date '{value}': {e}")))
        }

        fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
            let datetime = Datetime::deserialize(MapAccessDeserializer::new(map))?;
            if datetime.time.is_some() || datetime.offset.is_some() {
                return Err(de::Error::custom(format!(
                    "expected a date without a time, found {datetime}"
                )));
            }
            datetime
                .date
                .and_then(|date| {
                    NaiveDate::from_ymd_opt(
                        i32::from(date.year),
                        u32::from(date.month),
                        u32::from(date.day),
                    )
                })
                .map(ConfigDate)
                .ok_or_else(|| de::Error::custom(format!("invalid date '{datetime}'")))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        ConfigDate::deserialize(deserializer).map(|date| date.0)
    }

    pub fn deserialize_option<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        Option::<ConfigDate>::deserialize(deserializer).map(|date| date.map(|d| d.0))
    }
}
