//! Profile records extracted from Scholar result pages.

use serde::{Deserialize, Serialize};

/// Column headers matching [`ProfileRecord::to_row`].
pub const PROFILE_COLUMNS: [&str; 6] = [
    "name",
    "profile_link",
    "affiliation",
    "email",
    "cited_by",
    "interests",
];

/// One author found on a search result page.
///
/// Fields missing from the markup are empty, never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub name: String,

    /// Absolute profile URL, empty when the result carried no link
    pub profile_link: String,

    pub affiliation: String,

    /// Verified-email line as shown, e.g. "Verified email at umich.edu"
    pub email: String,

    /// Citation text as shown, e.g. "Cited by 1234"
    pub citation_metric: String,

    /// Interest tags in display order
    pub interests: Vec<String>,
}

impl ProfileRecord {
    /// Numeric citation count parsed from the citation text.
    pub fn citation_count(&self) -> Option<u64> {
        parse_count(&self.citation_metric)
    }

    /// Flatten into a row for the delimited-text writer.
    ///
    /// The writer does no quoting, so commas inside a field ("Professor of
    /// Physics, MIT") become `;` and interests are joined with `;`. Every row
    /// has exactly [`PROFILE_COLUMNS`] entries.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            column(&self.name),
            column(&self.profile_link),
            column(&self.affiliation),
            column(&self.email),
            column(&self.citation_metric),
            self.interests
                .iter()
                .map(|interest| column(interest))
                .collect::<Vec<_>>()
                .join(";"),
        ]
    }
}

fn column(text: &str) -> String {
    text.replace(',', ";")
}

/// Records and continuation token of a single fetched page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageResult {
    pub records: Vec<ProfileRecord>,
    pub next_token: Option<String>,
}

/// Details shown on an individual profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDetails {
    pub user_id: String,
    pub name: String,
    pub affiliation: String,
    pub interests: Vec<String>,

    /// All-time citation count from the stats table
    pub citations: Option<u64>,
}

/// Pull the digits out of text such as "Cited by 1,234".
pub(crate) fn parse_count(text: &str) -> Option<u64> {
    let digits: String = text
        .split_whitespace()
        .find(|word| word.chars().next().is_some_and(|c| c.is_ascii_digit()))?
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
