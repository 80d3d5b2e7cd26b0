//! Mock fetcher and page builders for testing purposes.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use crate::sources::{Fetch, FetchRequest, HarvestError};

#[derive(Debug, Clone)]
enum MockResponse {
    Body(String),
    Transport(String),
    Status(u16),
    RateLimited(Option<u64>),
}

/// A fetcher that replays scripted responses in order and records every request.
///
/// Once the script runs out every further call fails with a transport error,
/// so an empty mock behaves like an unreachable host.
#[derive(Debug, Default)]
pub struct MockFetcher {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<FetchRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockFetcher {
    /// Create a mock with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock serving `bodies` in order.
    pub fn with_pages<I, S>(bodies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        for body in bodies {
            mock.push_body(body);
        }
        mock
    }

    /// Queue a successful response body.
    pub fn push_body(&self, body: impl Into<String>) {
        lock(&self.responses).push_back(MockResponse::Body(body.into()));
    }

    /// Queue a transport failure.
    pub fn push_transport_error(&self, message: impl Into<String>) {
        lock(&self.responses).push_back(MockResponse::Transport(message.into()));
    }

    /// Queue a non-success HTTP status that is not 429.
    pub fn push_status(&self, status: u16) {
        lock(&self.responses).push_back(MockResponse::Status(status));
    }

    /// Queue a 429 response.
    pub fn push_rate_limited(&self, retry_after: Option<u64>) {
        lock(&self.responses).push_back(MockResponse::RateLimited(retry_after));
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<FetchRequest> {
        lock(&self.requests).clone()
    }

    /// `astart` of every request received so far.
    pub fn requested_offsets(&self) -> Vec<u32> {
        lock(&self.requests)
            .iter()
            .filter_map(|r| r.param("astart")?.parse().ok())
            .collect()
    }
}

#[async_trait]
impl Fetch for MockFetcher {
    async fn get(&self, request: &FetchRequest) -> Result<String, HarvestError> {
        lock(&self.requests).push(request.clone());

        match lock(&self.responses).pop_front() {
            Some(MockResponse::Body(body)) => Ok(body),
            Some(MockResponse::Transport(message)) => Err(HarvestError::Transport(message)),
            Some(MockResponse::Status(status)) => Err(HarvestError::Blocked(status)),
            Some(MockResponse::RateLimited(retry_after)) => {
                Err(HarvestError::RateLimited { retry_after })
            }
            None => Err(HarvestError::Transport(
                "mock fetcher has no more responses".to_string(),
            )),
        }
    }
}

/// Build an author-search result page.
///
/// `authors` are `(user_id, name)` pairs; a `next_token` adds the next-page
/// button with the same escaped `onclick` script Scholar emits.
pub fn author_page(authors: &[(&str, &str)], next_token: Option<&str>) -> String {
    let cards: String = authors
        .iter()
        .map(|(user, name)| {
            format!(
                r#"<div class="gsc_1usr"><div class="gs_ai gs_scl gs_ai_chpr"><div class="gs_ai_t">
<h3 class="gs_ai_name"><a href="/citations?hl=en&amp;user={user}">{name}</a></h3>
<div class="gs_ai_aff">Test University</div>
<div class="gs_ai_eml">Verified email at test.edu</div>
<div class="gs_ai_cby">Cited by 100</div>
<div class="gs_ai_int"><a class="gs_ai_one_int" href="/citations?view_op=search_authors">Physics</a></div>
</div></div></div>"#
            )
        })
        .collect();

    let button = match next_token {
        Some(token) => format!(
            r#"<button type="button" class="gs_btnPR gs_in_ib gs_btn_half gs_btn_lsb" onclick="window.location='/citations?view_op\x3dsearch_authors\x26hl\x3den\x26after_author\x3d{token}\x26astart\x3d10'"></button>"#
        ),
        None => r#"<button type="button" class="gs_btnPR gs_in_ib gs_btn_half gs_btn_lsb" disabled></button>"#.to_string(),
    };

    format!(
        r#"<!doctype html><html><head><title>Search Authors</title></head><body>
<div id="gsc_sa_ccl">{cards}</div>
<div id="gsc_authors_bottom_pag">{button}</div>
</body></html>"#
    )
}
