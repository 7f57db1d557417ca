//! Run output and its printable summary.

use chrono::{DateTime, NaiveDate, Utc};
use footfall_analytics::VisitSummary;
use footfall_common::{PatternRecord, Placekey};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    /// Identifier of the run that produced this output
    pub run_id: Uuid,
    /// When the run finished
    pub generated_at: DateTime<Utc>,
    /// Places joined with their total visits
    pub places: Vec<VisitSummary>,
    /// Weekly records of known places, in period order
    pub patterns: Vec<PatternRecord>,
    /// Weeks skipped because their response was malformed
    pub skipped_periods: Vec<NaiveDate>,
}

/// What the binary prints for a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary<'a> {
    /// Identifier of the run
    pub run_id: Uuid,
    /// When the run finished
    pub generated_at: DateTime<Utc>,
    /// Number of weekly records kept
    pub pattern_records: usize,
    /// Weeks skipped
    pub skipped_periods: &'a [NaiveDate],
    /// The places table
    pub places: &'a [VisitSummary],
}

impl<'a> From<&'a PipelineOutput> for RunSummary<'a> {
    fn from(output: &'a PipelineOutput) -> Self {
        Self {
            run_id: output.run_id,
            generated_at: output.generated_at,
            pattern_records: output.patterns.len(),
            skipped_periods: &output.skipped_periods,
            places: &output.places,
        }
    }
}

/// Parses a comma separated placekey list, ignoring blanks.
pub fn parse_selection(raw: &str) -> Vec<Placekey> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(Placekey::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selection() {
        let keys = parse_selection(" abc , ,def,");
        assert_eq!(keys, vec![Placekey::from("abc"), Placekey::from("def")]);
        assert!(parse_selection("").is_empty());
    }

    #[test]
    fn test_summary_counts_records() {
        let output = PipelineOutput {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            places: Vec::new(),
            patterns: vec![footfall_common::test_utils::pattern("a", "2022-01-02", 1)],
            skipped_periods: Vec::new(),
        };
        let summary = RunSummary::from(&output);
        assert_eq!(summary.pattern_records, 1);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["pattern_records"], 1);
        assert_eq!(json["run_id"], output.run_id.to_string());
    }
}
