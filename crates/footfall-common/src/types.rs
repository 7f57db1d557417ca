//! Domain records and newtype wrappers shared across the pipeline.

use crate::utils::{null_as_default, parse_week_start};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable provider-assigned identifier of a physical location.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Placekey(pub String);

impl Placekey {
    /// Creates a placekey from any string-like value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrows the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Placekey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Placekey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Placekey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Provider API key.
///
/// `Debug` and `Display` never print the secret, so the key can travel
/// through `#[instrument]` spans and error messages safely.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a raw credential.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw credential, for the request header only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the credential is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Core metadata of a place, one row of the places table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Join key shared with the weekly records
    pub placekey: Placekey,
    /// Display name
    pub location_name: Option<String>,
    /// Street line of the address
    pub street_address: Option<String>,
    /// WGS84 latitude
    pub latitude: Option<f64>,
    /// WGS84 longitude
    pub longitude: Option<f64>,
}

/// Visits observed during one hour of one week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyVisits {
    /// Visit count; `null` reads as zero
    #[serde(default, deserialize_with = "null_as_default")]
    pub visits: u64,
}

/// One place's visitation statistics for a single calendar week.
///
/// `visits_by_each_hour` and `related_same_day_brand` must be present in the
/// provider payload; a `null` value is read as empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRecord {
    /// Place the week belongs to
    pub placekey: Placekey,
    /// Display name at the time of the week
    pub location_name: Option<String>,
    /// ISO-8601 timestamp of the week start, as sent by the provider
    pub date_range_start: Option<String>,
    /// Visits observed during the week
    #[serde(default, deserialize_with = "null_as_default")]
    pub raw_visit_counts: u64,
    /// Median dwell time in minutes
    pub median_dwell: Option<f64>,
    /// Median distance travelled from home, in meters
    pub distance_from_home: Option<f64>,
    /// Hourly visits in positional order; entry `i` is hour `i % 24`
    #[serde(deserialize_with = "null_as_default")]
    pub visits_by_each_hour: Vec<HourlyVisits>,
    /// Visit counts per dwell-time bucket, keyed by bucket label
    #[serde(default, deserialize_with = "null_as_default")]
    pub bucketed_dwell_times: BTreeMap<String, u64>,
    /// Same-day visits to other brands, keyed by brand name
    #[serde(deserialize_with = "null_as_default")]
    pub related_same_day_brand: BTreeMap<String, u64>,
}

impl PatternRecord {
    /// Calendar date the record's week starts on, when the provider sent one.
    pub fn week_start(&self) -> Option<NaiveDate> {
        self.date_range_start.as_deref().and_then(parse_week_start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placekey_display_and_serde() {
        let key = Placekey::from("zzw-222@5yv-hq5-6c5");
        assert_eq!(key.to_string(), "zzw-222@5yv-hq5-6c5");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"zzw-222@5yv-hq5-6c5\"");
    }

    #[test]
    fn test_api_key_is_redacted() {
        let key = ApiKey::new("super-secret");
        assert_eq!(format!("{key:?}"), "ApiKey(***)");
        assert_eq!(key.to_string(), "***");
        assert_eq!(key.expose(), "super-secret");
        assert!(ApiKey::new("  ").is_blank());
    }

    #[test]
    fn test_place_deserialization() {
        let json = r#"{
            "placekey": "222-222@5yv-hq5-6c5",
            "location_name": "Broulim's",
            "street_address": "124 S 2nd W",
            "latitude": 43.8231,
            "longitude": -111.7924
        }"#;
        let place: Place = serde_json::from_str(json).unwrap();
        assert_eq!(place.placekey.as_str(), "222-222@5yv-hq5-6c5");
        assert_eq!(place.location_name.as_deref(), Some("Broulim's"));
        assert_eq!(place.latitude, Some(43.8231));
    }

    #[test]
    fn test_pattern_record_deserialization() {
        let json = r#"{
            "placekey": "222-222@5yv-hq5-6c5",
            "location_name": "Broulim's",
            "date_range_start": "2022-01-03T00:00:00-07:00",
            "raw_visit_counts": 412,
            "distance_from_home": 5310.0,
            "median_dwell": 14.5,
            "visits_by_each_hour": [{"visits": 3}, {"visits": 0}, {"visits": 7}],
            "bucketed_dwell_times": {"<5": 40, "5-10": 120},
            "related_same_day_brand": {"Walmart": 21, "Maverik": 9}
        }"#;
        let record: PatternRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.raw_visit_counts, 412);
        assert_eq!(record.visits_by_each_hour.len(), 3);
        assert_eq!(record.visits_by_each_hour[2].visits, 7);
        assert_eq!(record.related_same_day_brand.get("Walmart"), Some(&21));
        assert_eq!(record.bucketed_dwell_times.get("5-10"), Some(&120));
        assert_eq!(
            record.week_start(),
            NaiveDate::from_ymd_opt(2022, 1, 3)
        );
    }

    #[test]
    fn test_pattern_record_nulls_read_as_empty() {
        let json = r#"{
            "placekey": "abc",
            "location_name": null,
            "date_range_start": null,
            "raw_visit_counts": null,
            "distance_from_home": null,
            "median_dwell": null,
            "visits_by_each_hour": null,
            "related_same_day_brand": null
        }"#;
        let record: PatternRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.raw_visit_counts, 0);
        assert!(record.visits_by_each_hour.is_empty());
        assert!(record.related_same_day_brand.is_empty());
        assert!(record.bucketed_dwell_times.is_empty());
        assert!(record.week_start().is_none());
    }

    #[test]
    fn test_pattern_record_requires_hourly_entries() {
        let json = r#"{
            "placekey": "abc",
            "location_name": "Somewhere",
            "date_range_start": "2022-01-03T00:00:00-07:00",
            "raw_visit_counts": 10,
            "distance_from_home": null,
            "median_dwell": null,
            "related_same_day_brand": {}
        }"#;
        let err = serde_json::from_str::<PatternRecord>(json).unwrap_err();
        assert!(err.to_string().contains("visits_by_each_hour"));
    }
}
