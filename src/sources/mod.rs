//! Fetching and harvesting Scholar author-search pages.
//!
//! The network seam is the [`Fetch`] trait: [`HttpFetcher`](crate::utils::HttpFetcher)
//! talks to the real service, [`MockFetcher`] serves scripted pages in tests.
//! [`ScholarHarvester`] is the entry point; it builds one fetcher per harvest and
//! hands it to a [`HarvestSession`] which drives the pagination loop until the
//! result pages stop handing out continuation tokens.
//!
//! # Example
//!
//! ```rust,no_run
//! use scholar_harvest::config::HarvestConfig;
//! use scholar_harvest::sources::ScholarHarvester;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let harvester = ScholarHarvester::new(HarvestConfig::default());
//! let outcome = harvester
//!     .harvest("physics", "Michigan University", &CancellationToken::new())
//!     .await?;
//! println!("{} profiles ({:?})", outcome.records.len(), outcome.status);
//! # Ok(())
//! # }
//! ```

mod extract;
mod google_scholar;
pub mod mock;
mod session;
mod token;

pub use extract::{extract_profile_details, extract_records};
pub use google_scholar::ScholarHarvester;
pub use mock::MockFetcher;
pub use session::{HarvestOutcome, HarvestSession, HarvestStatus};
pub use token::{parse_continuation_token, resolve_continuation_token};

use async_trait::async_trait;
use std::sync::Arc;

/// A single GET request: URL, headers and ordered query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub params: Vec<(&'static str, String)>,
}

impl FetchRequest {
    /// Create a request without headers or parameters
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Add a header
    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Replace the query parameters
    pub fn params(mut self, params: Vec<(&'static str, String)>) -> Self {
        self.params = params;
        self
    }

    /// Value of a query parameter, if set
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// The Fetch Client seam: perform a GET and return the raw body.
///
/// Implementations own their connection pool; dropping the fetcher releases it.
#[async_trait]
pub trait Fetch: Send + Sync + std::fmt::Debug {
    async fn get(&self, request: &FetchRequest) -> Result<String, HarvestError>;
}

#[async_trait]
impl<T: Fetch + ?Sized> Fetch for Arc<T> {
    async fn get(&self, request: &FetchRequest) -> Result<String, HarvestError> {
        (**self).get(request).await
    }
}

/// Errors that can occur while harvesting
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    /// Network, timeout or server-side failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// HTTP 429 from the remote service
    #[error("Rate limited by remote service")]
    RateLimited { retry_after: Option<u64> },

    /// Non-retryable HTTP status, usually an anti-bot block
    #[error("Request blocked with HTTP status {0}")]
    Blocked(u16),

    /// An expected structural element is missing from a page
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// Caller supplied an unusable query
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The harvest was cancelled by the caller
    #[error("Harvest cancelled")]
    Cancelled,

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for HarvestError {
    fn from(err: reqwest::Error) -> Self {
        HarvestError::Transport(err.to_string())
    }
}

impl From<config::ConfigError> for HarvestError {
    fn from(err: config::ConfigError) -> Self {
        HarvestError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_request_builder() {
        let request = FetchRequest::new("https://scholar.google.com/citations")
            .header("User-Agent", "test")
            .params(vec![("hl", "en".to_string()), ("astart", "10".to_string())]);

        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.param("astart"), Some("10"));
        assert_eq!(request.param("after_author"), None);
    }

    #[test]
    fn test_error_display() {
        let err = HarvestError::Blocked(403);
        assert!(err.to_string().contains("403"));

        let err = HarvestError::InvalidQuery("label must not be empty".to_string());
        assert!(err.to_string().contains("label"));
    }
}
