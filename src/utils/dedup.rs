//! Aggregation and deduplication of harvested profiles.

use std::collections::HashSet;

use crate::models::ProfileRecord;

/// Append-only collection of records, unique by profile link.
///
/// The first record seen for a link wins; later duplicates are dropped. Records
/// without a link cannot be compared and are always kept.
#[derive(Debug, Default)]
pub struct ProfileAggregator {
    records: Vec<ProfileRecord>,
    seen_links: HashSet<String>,
    duplicates: usize,
}

impl ProfileAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one record; returns `false` if it was a duplicate.
    pub fn push(&mut self, record: ProfileRecord) -> bool {
        if !record.profile_link.is_empty() && !self.seen_links.insert(record.profile_link.clone()) {
            self.duplicates += 1;
            return false;
        }
        self.records.push(record);
        true
    }

    /// Add a page of records; returns how many were new.
    pub fn extend(&mut self, records: impl IntoIterator<Item = ProfileRecord>) -> usize {
        let mut added = 0;
        for record in records {
            if self.push(record) {
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records dropped as duplicates so far
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn records(&self) -> &[ProfileRecord] {
        &self.records
    }

    /// Final ordered sequence, first-seen order
    pub fn into_records(self) -> Vec<ProfileRecord> {
        self.records
    }
}

/// Deduplicate a list of records by profile link, keeping first occurrences.
pub fn deduplicate_profiles(records: Vec<ProfileRecord>) -> Vec<ProfileRecord> {
    let mut aggregator = ProfileAggregator::new();
    aggregator.extend(records);
    aggregator.into_records()
}
