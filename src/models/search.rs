//! Author-search query state and request parameter construction.

use serde::{Deserialize, Serialize};

use crate::sources::HarvestError;

/// Number of author results Scholar serves per page.
pub const PAGE_SIZE: u32 = 10;

/// Language used when the caller does not name one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Ordered request parameters, name to value.
pub type QueryParams = Vec<(&'static str, String)>;

/// What an author search matches on, rendered as the `mauthors` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthorFilter {
    /// Authors tagged with `label` whose affiliation mentions `organization`
    Affiliation { label: String, organization: String },

    /// Authors tagged with a research field, any organization
    Field { field: String },

    /// Authors whose name matches a quoted phrase
    Name { name: String },
}

fn required<'a>(value: &'a str, what: &str) -> Result<&'a str, HarvestError> {
    match value.trim() {
        "" => Err(HarvestError::InvalidQuery(format!("{} must not be empty", what))),
        trimmed => Ok(trimmed),
    }
}

/// Scholar interest labels are lowercase with underscores: `machine_learning`.
fn label_slug(field: &str) -> String {
    field
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

impl AuthorFilter {
    pub fn affiliation(label: impl Into<String>, organization: impl Into<String>) -> Self {
        Self::Affiliation {
            label: label.into(),
            organization: organization.into(),
        }
    }

    pub fn field(field: impl Into<String>) -> Self {
        Self::Field {
            field: field.into(),
        }
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self::Name { name: name.into() }
    }

    /// The `mauthors` value; fails with [`HarvestError::InvalidQuery`] on blank input.
    pub fn mauthors(&self) -> Result<String, HarvestError> {
        match self {
            Self::Affiliation {
                label,
                organization,
            } => {
                let label = required(label, "label")?;
                let organization = required(organization, "organization")?;
                Ok(format!("label:{} \"{}\"", label, organization))
            }
            Self::Field { field } => Ok(format!("label:{}", label_slug(required(field, "field")?))),
            Self::Name { name } => Ok(format!("\"{}\"", required(name, "name")?)),
        }
    }
}

impl std::fmt::Display for AuthorFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Affiliation {
                label,
                organization,
            } => write!(f, "{} at {}", label.trim(), organization.trim()),
            Self::Field { field } => write!(f, "field {}", field.trim()),
            Self::Name { name } => write!(f, "name {}", name.trim()),
        }
    }
}

/// Build the parameter set for one author-search page.
///
/// Pure: identical inputs always give identical output. A blank `language`
/// falls back to [`DEFAULT_LANGUAGE`].
pub fn author_search_params(
    filter: &AuthorFilter,
    language: &str,
    offset: u32,
    continuation_token: Option<&str>,
) -> Result<QueryParams, HarvestError> {
    let mauthors = filter.mauthors()?;

    let language = match language.trim() {
        "" => DEFAULT_LANGUAGE,
        lang => lang,
    };

    let mut params: QueryParams = vec![
        ("view_op", "search_authors".to_string()),
        ("mauthors", mauthors),
        ("hl", language.to_string()),
        ("astart", offset.to_string()),
    ];

    if let Some(token) = continuation_token {
        params.push(("after_author", token.to_string()));
    }

    Ok(params)
}

/// Parameters for a label + organization search page.
///
/// Fails with [`HarvestError::InvalidQuery`] when `label` or `organization` is blank.
pub fn build_query_params(
    label: &str,
    organization: &str,
    language: &str,
    offset: u32,
    continuation_token: Option<&str>,
) -> Result<QueryParams, HarvestError> {
    author_search_params(
        &AuthorFilter::affiliation(label, organization),
        language,
        offset,
        continuation_token,
    )
}

/// Mutable pagination state of one harvest.
///
/// Only the harvest session advances it, once per successfully processed page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub filter: AuthorFilter,

    /// Interface language code (`hl`)
    pub language: String,

    /// Result offset of the next page to fetch (`astart`)
    pub offset: u32,

    /// Token handed out by the previous page, if any
    pub continuation_token: Option<String>,
}

impl SearchQuery {
    /// Create the initial label + organization query: offset 0, no token.
    ///
    /// Validates eagerly so a bad query fails before any network activity.
    pub fn new(
        label: impl Into<String>,
        organization: impl Into<String>,
        language: impl Into<String>,
    ) -> Result<Self, HarvestError> {
        Self::with_filter(AuthorFilter::affiliation(label, organization), language)
    }

    /// Initial state for any filter, validated.
    pub fn with_filter(
        filter: AuthorFilter,
        language: impl Into<String>,
    ) -> Result<Self, HarvestError> {
        let query = Self {
            filter,
            language: language.into(),
            offset: 0,
            continuation_token: None,
        };
        query.params()?;
        Ok(query)
    }

    /// Parameters for the page this state points at
    pub fn params(&self) -> Result<QueryParams, HarvestError> {
        author_search_params(
            &self.filter,
            &self.language,
            self.offset,
            self.continuation_token.as_deref(),
        )
    }

    /// Move to the next page using the token the current page supplied.
    ///
    /// The offset grows by [`PAGE_SIZE`] and saturates instead of wrapping.
    pub fn advance(&mut self, token: impl Into<String>) {
        self.offset = self.offset.saturating_add(PAGE_SIZE);
        self.continuation_token = Some(token.into());
    }
}
