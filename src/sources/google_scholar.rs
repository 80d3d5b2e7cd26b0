//! Google Scholar author harvesting.
//!
//! Google Scholar does not have an official public API. This implementation
//! scrapes the public author-search pages, which may violate Google's Terms of
//! Service and is subject to rate limiting and CAPTCHA blocks. Keep
//! `page_delay_ms` generous for anything but small harvests.

use scraper::Html;
use tokio_util::sync::CancellationToken;

use crate::config::HarvestConfig;
use crate::models::{AuthorFilter, ProfileDetails, ProfileRecord, SearchQuery};
use crate::sources::{
    extract_profile_details, extract_records, Fetch, FetchRequest, HarvestError, HarvestOutcome,
    HarvestSession,
};
use crate::utils::{deduplicate_profiles, with_retry, HarvestObserver, HttpFetcher, NoopObserver};

/// Entry point for harvesting author profiles.
#[derive(Debug, Clone, Default)]
pub struct ScholarHarvester {
    config: HarvestConfig,
}

impl ScholarHarvester {
    pub fn new(config: HarvestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Harvest every author matching `label` at `organization`.
    ///
    /// Returns `Err` only for an invalid query or configuration, before any
    /// request is sent. Network trouble, blocks and cancellation end up in the
    /// outcome's status alongside whatever was collected.
    pub async fn harvest(
        &self,
        label: &str,
        organization: &str,
        cancel: &CancellationToken,
    ) -> Result<HarvestOutcome, HarvestError> {
        self.harvest_observed(label, organization, cancel, &NoopObserver)
            .await
    }

    /// [`harvest`](Self::harvest) reporting progress to `observer`.
    pub async fn harvest_observed(
        &self,
        label: &str,
        organization: &str,
        cancel: &CancellationToken,
        observer: &dyn HarvestObserver,
    ) -> Result<HarvestOutcome, HarvestError> {
        let query = SearchQuery::new(label, organization, self.config.language.as_str())?;
        self.harvest_query(query, cancel, observer).await
    }

    /// Harvest every author tagged with a research field, at any organization.
    pub async fn harvest_field(
        &self,
        field: &str,
        cancel: &CancellationToken,
        observer: &dyn HarvestObserver,
    ) -> Result<HarvestOutcome, HarvestError> {
        let query = SearchQuery::with_filter(AuthorFilter::field(field), self.config.language.as_str())?;
        self.harvest_query(query, cancel, observer).await
    }

    /// Harvest an already built query over a fresh [`HttpFetcher`].
    pub async fn harvest_query(
        &self,
        query: SearchQuery,
        cancel: &CancellationToken,
        observer: &dyn HarvestObserver,
    ) -> Result<HarvestOutcome, HarvestError> {
        self.config.validate()?;
        let fetcher = HttpFetcher::new(&self.config)?;
        self.harvest_with(fetcher, query, cancel, observer).await
    }

    /// Run a harvest over a caller-supplied fetcher. The fetcher is dropped when
    /// the harvest ends.
    pub async fn harvest_with<F: Fetch>(
        &self,
        fetcher: F,
        query: SearchQuery,
        cancel: &CancellationToken,
        observer: &dyn HarvestObserver,
    ) -> Result<HarvestOutcome, HarvestError> {
        let session = HarvestSession::new(fetcher, &self.config, query)?.with_observer(observer);
        Ok(session.run(cancel).await)
    }

    /// Authors matching a quoted name, first result page only.
    pub async fn search_by_name(&self, name: &str) -> Result<Vec<ProfileRecord>, HarvestError> {
        let query = SearchQuery::with_filter(AuthorFilter::name(name), self.config.language.as_str())?;
        self.config.validate()?;
        let fetcher = HttpFetcher::new(&self.config)?;
        self.search_page_with(&fetcher, &query).await
    }

    /// Fetch and extract the single page `query` points at.
    ///
    /// Unlike a harvest, a page without the results container is an error here.
    pub async fn search_page_with<F: Fetch>(
        &self,
        fetcher: &F,
        query: &SearchQuery,
    ) -> Result<Vec<ProfileRecord>, HarvestError> {
        let request = FetchRequest::new(self.config.search_url()?)
            .header("User-Agent", self.config.user_agent.as_str())
            .params(query.params()?);

        tracing::debug!(filter = %query.filter, offset = query.offset, "Fetching single author page");
        let body = with_retry(self.config.retry.into(), || fetcher.get(&request)).await?;

        let document = Html::parse_document(&body);
        let records = extract_records(&document, &self.config.base()?)?;
        Ok(deduplicate_profiles(records))
    }

    /// Look up a single profile page by Scholar user id.
    pub async fn fetch_profile(&self, user_id: &str) -> Result<ProfileDetails, HarvestError> {
        let fetcher = HttpFetcher::new(&self.config)?;
        self.fetch_profile_with(&fetcher, user_id).await
    }

    /// [`fetch_profile`](Self::fetch_profile) over a caller-supplied fetcher.
    pub async fn fetch_profile_with<F: Fetch>(
        &self,
        fetcher: &F,
        user_id: &str,
    ) -> Result<ProfileDetails, HarvestError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(HarvestError::InvalidQuery(
                "user id must not be empty".to_string(),
            ));
        }

        let request = FetchRequest::new(self.config.search_url()?)
            .header("User-Agent", self.config.user_agent.as_str())
            .params(vec![
                ("user", user_id.to_string()),
                ("hl", self.config.language.clone()),
            ]);

        tracing::debug!(user_id, "Fetching profile page");
        let body = with_retry(self.config.retry.into(), || fetcher.get(&request)).await?;

        let document = Html::parse_document(&body);
        extract_profile_details(&document, user_id)
    }
}
