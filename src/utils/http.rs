//! HTTP fetcher backed by reqwest.

use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, Client, StatusCode};
use std::time::Duration;

use crate::config::HarvestConfig;
use crate::sources::{Fetch, FetchRequest, HarvestError};

/// Fetch Client over a single pooled `reqwest::Client`.
///
/// One instance is created per harvest; dropping it closes its connections.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with the timeouts and user agent from `config`
    pub fn new(config: &HarvestConfig) -> Result<Self, HarvestError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self { client })
    }
}

fn retry_after_secs(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn get(&self, request: &FetchRequest) -> Result<String, HarvestError> {
        let mut builder = self.client.get(&request.url).query(&request.params);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| HarvestError::Transport(format!("Failed to fetch {}: {}", request.url, e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(HarvestError::RateLimited {
                retry_after: retry_after_secs(&response),
            });
        }
        if status.is_server_error() {
            return Err(HarvestError::Transport(format!(
                "Server returned status: {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(HarvestError::Blocked(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| HarvestError::Transport(format!("Failed to read response: {}", e)))
    }
}
