//! # Footfall Pipeline
//!
//! Runs the places and weekly patterns queries for one credential, joins the
//! results, and serves repeated runs from a per-credential cache.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod output;
pub mod pipeline;

pub use cache::{CacheMetrics, CacheStats, ResultCache};
pub use output::{parse_selection, PipelineOutput, RunSummary};
pub use pipeline::{analyze_selection, Pipeline};
