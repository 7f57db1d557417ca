//! In-memory provider for tests.
//!
//! [`FakeProvider`] answers both query documents from fixed data, honours
//! `$first`/`$after` with offset cursors, and records every request it sees.

use crate::queries::{PLACES_BY_REGION, WEEKLY_PATTERNS_BY_REGION};
use crate::transport::{GraphQlRequest, QueryTransport};
use async_trait::async_trait;
use footfall_common::{format_query_date, ApiKey, FootfallError, PatternRecord, Place, Result};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};

type Handler = Box<dyn Fn(&GraphQlRequest) -> Result<Value> + Send + Sync>;

/// Scripted [`QueryTransport`].
pub struct FakeProvider {
    handler: Handler,
    api_key: Option<String>,
    requests: Mutex<Vec<GraphQlRequest>>,
}

impl FakeProvider {
    /// Answers every request with `handler`.
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&GraphQlRequest) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            api_key: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Serves `places` for the places query and, for each weekly query, the
    /// records whose week starts on `$date`.
    pub fn with_data(places: Vec<Place>, patterns: Vec<PatternRecord>) -> Self {
        Self::with_handler(move |request| {
            let first = request
                .variables
                .get("first")
                .and_then(Value::as_u64)
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(500);
            let offset = request
                .variable_str("after")
                .and_then(|cursor| cursor.parse::<usize>().ok())
                .unwrap_or(0);

            if request.operation_name == PLACES_BY_REGION.operation_name {
                Ok(slice_page(&places, PLACES_BY_REGION.node_field, offset, first))
            } else if request.operation_name == WEEKLY_PATTERNS_BY_REGION.operation_name {
                let date = request.variable_str("date").unwrap_or_default();
                let week: Vec<&PatternRecord> = patterns
                    .iter()
                    .filter(|record| {
                        record
                            .week_start()
                            .is_some_and(|start| format_query_date(start) == date)
                    })
                    .collect();
                Ok(slice_page(
                    &week,
                    WEEKLY_PATTERNS_BY_REGION.node_field,
                    offset,
                    first,
                ))
            } else {
                Err(FootfallError::query(format!(
                    "Unknown operation {}",
                    request.operation_name
                )))
            }
        })
    }

    /// Rejects requests made with any other credential.
    #[must_use]
    pub fn require_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<GraphQlRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received for one operation.
    pub fn request_count(&self, operation_name: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.operation_name == operation_name)
            .count()
    }
}

#[async_trait]
impl QueryTransport for FakeProvider {
    async fn execute(&self, credential: &ApiKey, request: &GraphQlRequest) -> Result<Value> {
        self.requests.lock().push(request.clone());

        if let Some(expected) = &self.api_key {
            if credential.expose() != expected {
                return Err(FootfallError::auth_with_status("Invalid API key", 401));
            }
        }
        (self.handler)(request)
    }
}

/// Wraps records as one page of `search.places.results`.
pub fn results_page<R: Serialize>(
    records: &[R],
    node_field: &str,
    has_next_page: bool,
    end_cursor: Option<&str>,
) -> Value {
    let edges: Vec<Value> = records
        .iter()
        .map(|record| json!({ "node": { node_field: record } }))
        .collect();
    json!({
        "search": { "places": { "results": {
            "pageInfo": { "hasNextPage": has_next_page, "endCursor": end_cursor },
            "edges": edges
        }}}
    })
}

fn slice_page<R: Serialize>(records: &[R], node_field: &str, offset: usize, first: usize) -> Value {
    let start = offset.min(records.len());
    let end = start.saturating_add(first).min(records.len());
    let has_next_page = end < records.len();
    let cursor = end.to_string();
    results_page(
        &records[start..end],
        node_field,
        has_next_page,
        Some(cursor.as_str()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use footfall_common::test_utils::{pattern, place};
    use serde_json::Map;

    fn request(operation_name: &'static str, vars: Value) -> GraphQlRequest {
        let variables: Map<String, Value> = serde_json::from_value(vars).unwrap();
        GraphQlRequest {
            query: "",
            operation_name,
            variables,
        }
    }

    #[tokio::test]
    async fn test_pages_with_offset_cursors() {
        let fake = FakeProvider::with_data(
            vec![place("a", "A"), place("b", "B"), place("c", "C")],
            Vec::new(),
        );
        let key = ApiKey::new("k");

        let first = fake
            .execute(&key, &request("PlacesByRegion", json!({"first": 2, "after": ""})))
            .await
            .unwrap();
        let info = &first["search"]["places"]["results"]["pageInfo"];
        assert_eq!(info["hasNextPage"], true);
        assert_eq!(info["endCursor"], "2");

        let second = fake
            .execute(&key, &request("PlacesByRegion", json!({"first": 2, "after": "2"})))
            .await
            .unwrap();
        let results = &second["search"]["places"]["results"];
        assert_eq!(results["pageInfo"]["hasNextPage"], false);
        assert_eq!(results["edges"].as_array().unwrap().len(), 1);
        assert_eq!(fake.request_count("PlacesByRegion"), 2);
    }

    #[tokio::test]
    async fn test_weekly_records_filtered_by_date() {
        let fake = FakeProvider::with_data(
            Vec::new(),
            vec![pattern("a", "2022-01-02", 1), pattern("a", "2022-01-09", 2)],
        );
        let page = fake
            .execute(
                &ApiKey::new("k"),
                &request("WeeklyPatternsByRegion", json!({"date": "2022-01-09"})),
            )
            .await
            .unwrap();
        let edges = page["search"]["places"]["results"]["edges"].as_array().unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0]["node"]["safegraph_weekly_patterns"]["raw_visit_counts"], 2);
    }

    #[tokio::test]
    async fn test_wrong_key_is_rejected() {
        let fake = FakeProvider::with_data(Vec::new(), Vec::new()).require_api_key("right");
        let err = fake
            .execute(&ApiKey::new("wrong"), &request("PlacesByRegion", json!({})))
            .await
            .unwrap_err();
        assert!(err.is_auth());
        assert_eq!(fake.requests().len(), 1);
    }
}
