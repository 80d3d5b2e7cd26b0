//! Utility modules supporting harvests.
//!
//! - [`HttpFetcher`]: reqwest-backed Fetch Client
//! - [`RetryConfig`] / [`with_retry`]: exponential backoff for transient failures
//! - [`ProfileAggregator`]: append-only, link-unique record collection
//! - [`write_delimited`] / [`read_delimited`]: naive comma-delimited files
//! - [`HarvestObserver`]: progress hooks
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use scholar_harvest::sources::HarvestError;
//! use scholar_harvest::utils::{with_retry, RetryConfig};
//!
//! # async fn fetch_page() -> Result<String, HarvestError> { Ok("<html></html>".to_string()) }
//! # #[tokio::main]
//! # async fn main() -> Result<(), HarvestError> {
//! let config = RetryConfig::default().max_attempts(3);
//! let body = with_retry(config, || fetch_page()).await?;
//! # Ok(())
//! # }
//! ```

mod dedup;
mod delimited;
mod http;
mod progress;
mod retry;

pub use dedup::{deduplicate_profiles, ProfileAggregator};
pub use delimited::{read_delimited, write_delimited};
pub use http::HttpFetcher;
pub use progress::{HarvestObserver, NoopObserver};
pub use retry::{with_retry, with_retry_notify, RetryConfig, TransientError};
