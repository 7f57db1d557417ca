//! Shared utility functions.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

/// Formats a date the way the provider expects it in query variables.
pub fn format_query_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Extracts the calendar date from an ISO-8601 week start such as
/// `2022-01-03T00:00:00-07:00`. The local date is kept; offsets are ignored.
pub fn parse_week_start(value: &str) -> Option<NaiveDate> {
    let date_part = value.get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Rounds to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Deserializes `null` as the type's default value.
pub fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
