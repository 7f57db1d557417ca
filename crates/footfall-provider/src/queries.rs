//! Query documents sent to the provider.
//!
//! Both documents filter by `$city`/`$region` and page with `$first`/`$after`.
//! Dates are bound through `$date`; nothing is templated into the text.

/// A named GraphQL document and the node field that holds its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryDocument {
    /// Operation name sent as `operationName`
    pub operation_name: &'static str,
    /// Full document text
    pub text: &'static str,
    /// Field under each `node` that wraps the record
    pub node_field: &'static str,
}

/// Core metadata of every place in a region.
pub const PLACES_BY_REGION: QueryDocument = QueryDocument {
    operation_name: "PlacesByRegion",
    node_field: "safegraph_core",
    text: r"query PlacesByRegion($city: String!, $region: String!, $first: Int!, $after: String) {
  search(filter: { address: { city: $city, region: $region } }) {
    places {
      results(first: $first, after: $after) {
        pageInfo { hasNextPage endCursor }
        edges {
          node {
            safegraph_core {
              placekey
              location_name
              street_address
              latitude
              longitude
            }
          }
        }
      }
    }
  }
}",
};

/// Weekly patterns of every place in a region for the week of `$date`.
pub const WEEKLY_PATTERNS_BY_REGION: QueryDocument = QueryDocument {
    operation_name: "WeeklyPatternsByRegion",
    node_field: "safegraph_weekly_patterns",
    text: r"query WeeklyPatternsByRegion($city: String!, $region: String!, $date: DateTime!, $first: Int!, $after: String) {
  search(filter: { address: { city: $city, region: $region } }) {
    places {
      results(first: $first, after: $after) {
        pageInfo { hasNextPage endCursor }
        edges {
          node {
            safegraph_weekly_patterns(date: $date) {
              placekey
              location_name
              date_range_start
              raw_visit_counts
              distance_from_home
              median_dwell
              visits_by_each_hour {
                visits
              }
              bucketed_dwell_times
              related_same_day_brand
            }
          }
        }
      }
    }
  }
}",
};
