//! # Footfall Common
//!
//! Shared types, errors, and logging for the Footfall pipeline.
//!
//! This crate provides the domain records (places and weekly patterns), the
//! error taxonomy used by every other crate in the workspace, and the
//! tracing setup used by the binary.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use error::{FootfallError, Result};
pub use logging::{init_logging, LoggingConfig};
pub use types::*;
pub use utils::*;
