//! # Footfall Provider
//!
//! Everything that talks to the places data provider.
//!
//! This crate provides:
//! - The GraphQL transport seam and its HTTP implementation
//! - The two query documents sent to the provider
//! - Cursor pagination and node normalization
//! - The weekly schedule that drives one query per period

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod executor;
pub mod normalizer;
pub mod queries;
pub mod schedule;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{ClientMetrics, ProviderClient};
pub use executor::{PaginationLimits, QueryExecutor};
pub use normalizer::RecordNormalizer;
pub use queries::{QueryDocument, PLACES_BY_REGION, WEEKLY_PATTERNS_BY_REGION};
pub use schedule::{PatternCollection, TimeRangeDriver, WeeklySchedule};
pub use transport::{GraphQlError, GraphQlRequest, GraphQlResponse, QueryTransport};
