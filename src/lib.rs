//! # Scholar Harvest
//!
//! Harvests Google Scholar author profiles matching a research label and an
//! organization, following the result pages' continuation tokens until the last
//! page.
//!
//! ## Architecture
//!
//! - [`models`]: Query state, profile records and page results
//! - [`sources`]: The `Fetch` seam, record extraction, token resolution and the
//!   pagination driver
//! - [`utils`]: HTTP fetcher, retry with backoff, deduplication, delimited files
//! - [`config`]: Configuration management
//! - [`ui`]: Terminal progress and summaries for the CLI

pub mod config;
pub mod models;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use config::HarvestConfig;
pub use models::{ProfileRecord, SearchQuery};
pub use sources::{HarvestError, HarvestOutcome, HarvestStatus, ScholarHarvester};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
