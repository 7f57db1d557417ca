//! Cursor pagination over `search.places.results`.

use crate::queries::QueryDocument;
use crate::transport::{GraphQlRequest, QueryTransport};
use footfall_common::{null_as_default, ApiKey, FootfallError, Result};
use footfall_config::ProviderConfig;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

const RESULTS_POINTER: &str = "/search/places/results";
const RESULTS_PATH: &str = "search.places.results";

/// Bounds on one paginated fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationLimits {
    /// Results requested per page
    pub page_size: u32,
    /// Stop after this many pages
    pub max_pages: Option<u32>,
    /// Stop once this many nodes were collected
    pub max_records: Option<usize>,
}

impl Default for PaginationLimits {
    fn default() -> Self {
        Self {
            page_size: 500,
            max_pages: None,
            max_records: None,
        }
    }
}

impl From<&ProviderConfig> for PaginationLimits {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            page_size: config.page_size,
            max_pages: config.max_pages,
            max_records: config.max_records,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResultsPage {
    #[serde(rename = "pageInfo")]
    page_info: PageInfo,
    #[serde(default, deserialize_with = "null_as_default")]
    edges: Vec<Option<Edge>>,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    #[serde(rename = "hasNextPage")]
    has_next_page: bool,
    #[serde(rename = "endCursor", default)]
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Edge {
    #[serde(default)]
    node: Option<Value>,
}

impl ResultsPage {
    fn from_data(mut data: Value) -> Result<Self> {
        let results = data
            .pointer_mut(RESULTS_POINTER)
            .map(Value::take)
            .filter(|v| !v.is_null())
            .ok_or_else(|| FootfallError::malformed_at("Response has no results", RESULTS_PATH))?;

        serde_json::from_value(results).map_err(|e| {
            FootfallError::malformed_with_source("Results page has an unexpected shape", RESULTS_PATH, e)
        })
    }

    fn into_nodes(self) -> impl Iterator<Item = Value> {
        self.edges
            .into_iter()
            .flatten()
            .filter_map(|edge| edge.node)
            .filter(|node| !node.is_null())
    }
}

/// Runs a query document page by page and concatenates the result nodes.
pub struct QueryExecutor<T: ?Sized> {
    transport: Arc<T>,
    limits: PaginationLimits,
}

impl<T: QueryTransport + ?Sized> QueryExecutor<T> {
    /// Creates an executor over `transport`.
    pub const fn new(transport: Arc<T>, limits: PaginationLimits) -> Self {
        Self { transport, limits }
    }

    /// Pagination bounds in use.
    pub const fn limits(&self) -> PaginationLimits {
        self.limits
    }

    /// Fetches every page of `document` and returns the non-null nodes in
    /// provider order.
    ///
    /// `$first` and `$after` are bound here; `variables` carries the rest.
    /// The first request sends an empty `$after`.
    #[instrument(skip(self, credential, document, variables), fields(operation = document.operation_name))]
    pub async fn fetch_all(
        &self,
        credential: &ApiKey,
        document: &QueryDocument,
        variables: Map<String, Value>,
    ) -> Result<Vec<Value>> {
        let mut nodes = Vec::new();
        let mut cursor = String::new();
        let mut pages: u32 = 0;

        loop {
            let mut bound = variables.clone();
            bound.insert("first".to_string(), json!(self.limits.page_size));
            bound.insert("after".to_string(), json!(cursor));

            let request = GraphQlRequest {
                query: document.text,
                operation_name: document.operation_name,
                variables: bound,
            };

            let data = self.transport.execute(credential, &request).await?;
            let page = ResultsPage::from_data(data)?;
            pages += 1;

            let has_next_page = page.page_info.has_next_page;
            let end_cursor = page.page_info.end_cursor.clone();
            let before = nodes.len();
            nodes.extend(page.into_nodes());
            debug!(
                "Page {} returned {} nodes (has_next_page: {})",
                pages,
                nodes.len() - before,
                has_next_page
            );

            if let Some(max_records) = self.limits.max_records {
                if nodes.len() >= max_records {
                    if nodes.len() > max_records || has_next_page {
                        warn!(
                            "Stopping {} at {} records; provider has more results",
                            document.operation_name, max_records
                        );
                    }
                    nodes.truncate(max_records);
                    break;
                }
            }

            if !has_next_page {
                break;
            }

            if let Some(max_pages) = self.limits.max_pages {
                if pages >= max_pages {
                    warn!(
                        "Stopping {} after {} pages; provider has more results",
                        document.operation_name, max_pages
                    );
                    break;
                }
            }

            cursor = match end_cursor {
                Some(next) if !next.is_empty() && next != cursor => next,
                _ => {
                    return Err(FootfallError::malformed_at(
                        "Page reports more results without a new end cursor",
                        "search.places.results.pageInfo.endCursor",
                    ))
                }
            };
        }

        debug!(
            "Fetched {} nodes in {} pages for {}",
            nodes.len(),
            pages,
            document.operation_name
        );
        Ok(nodes)
    }
}
