//! Progress hooks for harvest sessions.
//!
//! The library never prints. Callers that want feedback pass an observer; the
//! CLI uses a spinner, tests can record calls.

use std::time::Duration;

use crate::sources::{HarvestError, HarvestStatus};

/// Receives progress events from a running harvest.
///
/// Every hook has a no-op default, implement only what you need.
pub trait HarvestObserver: Send + Sync {
    /// A page at `offset` was processed, adding `new_records` (total now `total`)
    fn page_harvested(&self, _offset: u32, _new_records: usize, _total: usize) {}

    /// A fetch failed transiently and will be retried after `delay`
    fn retrying(&self, _attempt: u32, _error: &HarvestError, _delay: Duration) {}

    /// The harvest reached a terminal state
    fn finished(&self, _status: HarvestStatus, _total: usize) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl HarvestObserver for NoopObserver {}
