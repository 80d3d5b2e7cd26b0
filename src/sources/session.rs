//! The pagination driver.
//!
//! A [`HarvestSession`] walks Scholar's author-search pages one at a time:
//!
//! ```text
//! Fetching --ok--> Extracting --> Advancing --token--> Fetching
//!    |                                 |
//!    +--retries exhausted--> Failed    +--no token--> Done
//! ```
//!
//! Exactly one request is in flight at any time and the fetcher is owned by the
//! session, so it is released on every exit path. Records gathered before a
//! failure or cancellation are always returned.

use scraper::Html;
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::HarvestConfig;
use crate::models::{PageResult, ProfileRecord, SearchQuery};
use crate::sources::{
    extract_records, resolve_continuation_token, Fetch, FetchRequest, HarvestError,
};
use crate::utils::{with_retry_notify, HarvestObserver, NoopObserver, ProfileAggregator};

/// Lifecycle of a harvest session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HarvestStatus {
    /// Not yet terminal; never carried by a returned outcome
    Running,
    /// The last page was reached (or the page limit hit)
    Done,
    /// Stopped early by exhausted retries, a permanent error or cancellation
    Failed,
}

/// What a finished harvest hands back to the caller.
#[derive(Debug)]
pub struct HarvestOutcome {
    /// Unique records in first-seen order
    pub records: Vec<ProfileRecord>,

    pub status: HarvestStatus,

    /// Why the harvest failed, when it did
    pub error: Option<HarvestError>,

    /// `astart` of every successfully fetched page, in order
    pub offsets: Vec<u32>,

    /// Records dropped because their link was already seen
    pub duplicates: usize,

    /// The page limit stopped the harvest while more pages were offered
    pub truncated: bool,
}

impl HarvestOutcome {
    /// `true` when every offered page was harvested
    pub fn is_complete(&self) -> bool {
        self.status == HarvestStatus::Done && !self.truncated
    }

    /// Number of pages fetched successfully
    pub fn pages(&self) -> usize {
        self.offsets.len()
    }
}

enum Step {
    Fetching,
    Extracting(String),
    Advancing(Option<String>),
    Done,
    Failed(HarvestError),
}

/// One-shot harvest over a single fetcher.
pub struct HarvestSession<'a, F: Fetch> {
    fetcher: F,
    config: &'a HarvestConfig,
    observer: &'a dyn HarvestObserver,
    base: Url,
    search_url: String,
    query: SearchQuery,
    records: ProfileAggregator,
    offsets: Vec<u32>,
    truncated: bool,
}

impl<'a, F: Fetch> HarvestSession<'a, F> {
    /// Create a session in its initial state: offset 0, no token, nothing harvested.
    pub fn new(fetcher: F, config: &'a HarvestConfig, query: SearchQuery) -> Result<Self, HarvestError> {
        config.validate()?;
        query.params()?;

        Ok(Self {
            fetcher,
            config,
            observer: &NoopObserver,
            base: config.base()?,
            search_url: config.search_url()?,
            query,
            records: ProfileAggregator::new(),
            offsets: Vec::new(),
            truncated: false,
        })
    }

    /// Report progress to `observer`
    pub fn with_observer(mut self, observer: &'a dyn HarvestObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Current pagination state
    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    /// Drive the harvest to a terminal state.
    ///
    /// `cancel` is checked before every fetch and interrupts retry backoff and
    /// politeness delays.
    pub async fn run(mut self, cancel: &CancellationToken) -> HarvestOutcome {
        tracing::info!(filter = %self.query.filter, "Starting author harvest");

        let mut step = Step::Fetching;
        loop {
            step = match step {
                Step::Fetching => self.fetch_page(cancel).await,
                Step::Extracting(body) => self.extract_page(&body),
                Step::Advancing(token) => self.advance(token, cancel).await,
                Step::Done => return self.finish(None),
                Step::Failed(error) => return self.finish(Some(error)),
            };
        }
    }

    async fn fetch_page(&mut self, cancel: &CancellationToken) -> Step {
        if cancel.is_cancelled() {
            return Step::Failed(HarvestError::Cancelled);
        }

        let params = match self.query.params() {
            Ok(params) => params,
            Err(e) => return Step::Failed(e),
        };
        let request = FetchRequest::new(self.search_url.as_str())
            .header("User-Agent", self.config.user_agent.as_str())
            .params(params);

        let offset = self.query.offset;
        tracing::debug!(offset, "Fetching author page");

        let fetcher = &self.fetcher;
        let observer = self.observer;
        let attempt = with_retry_notify(
            self.config.retry.into(),
            |attempt, error, delay| observer.retrying(attempt, error, delay),
            || fetcher.get(&request),
        );

        let result = tokio::select! {
            result = attempt => result,
            _ = cancel.cancelled() => Err(HarvestError::Cancelled),
        };

        match result {
            Ok(body) => {
                self.offsets.push(offset);
                Step::Extracting(body)
            }
            Err(error) => {
                tracing::warn!(offset, %error, "Giving up on author page");
                Step::Failed(error)
            }
        }
    }

    fn extract_page(&mut self, body: &str) -> Step {
        let offset = self.query.offset;

        let page = {
            let document = Html::parse_document(body);
            let records = extract_records(&document, &self.base).unwrap_or_else(|error| {
                tracing::warn!(offset, %error, "No records extracted from page");
                Vec::new()
            });
            PageResult {
                records,
                next_token: resolve_continuation_token(&document),
            }
        };

        let found = page.records.len();
        let added = self.records.extend(page.records);
        tracing::debug!(offset, found, added, total = self.records.len(), "Extracted author page");
        self.observer
            .page_harvested(offset, added, self.records.len());

        Step::Advancing(page.next_token)
    }

    async fn advance(&mut self, token: Option<String>, cancel: &CancellationToken) -> Step {
        let Some(token) = token else {
            tracing::debug!("No continuation token, last page reached");
            return Step::Done;
        };

        if let Some(max_pages) = self.config.max_pages {
            if self.offsets.len() >= max_pages {
                tracing::info!(max_pages, "Page limit reached, stopping harvest");
                self.truncated = true;
                return Step::Done;
            }
        }

        self.query.advance(token);

        if self.config.page_delay_ms > 0 {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(self.config.page_delay_ms)) => {}
                _ = cancel.cancelled() => {}
            }
        }

        Step::Fetching
    }

    fn finish(self, error: Option<HarvestError>) -> HarvestOutcome {
        let status = if error.is_some() {
            HarvestStatus::Failed
        } else {
            HarvestStatus::Done
        };

        match &error {
            None => tracing::info!(
                records = self.records.len(),
                pages = self.offsets.len(),
                "Author harvest complete"
            ),
            Some(error) => tracing::warn!(
                records = self.records.len(),
                pages = self.offsets.len(),
                %error,
                "Author harvest failed, returning partial results"
            ),
        }
        self.observer.finished(status, self.records.len());

        let Self {
            fetcher,
            records,
            offsets,
            truncated,
            ..
        } = self;
        drop(fetcher);

        HarvestOutcome {
            duplicates: records.duplicates(),
            records: records.into_records(),
            status,
            error,
            offsets,
            truncated,
        }
    }
}
