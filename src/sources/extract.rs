//! Record extraction from author-search and profile pages.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::models::{parse_count, ProfileDetails, ProfileRecord};
use crate::sources::HarvestError;

/// List holding every author card of a result page
const RESULTS_CONTAINER: &str = "#gsc_sa_ccl";
const RESULT_CARD: &str = ".gs_ai_chpr";
const NAME: &str = ".gs_ai_name";
const NAME_LINK: &str = ".gs_ai_name a";
const AFFILIATION: &str = ".gs_ai_aff";
const EMAIL: &str = ".gs_ai_eml";
const CITED_BY: &str = ".gs_ai_cby";
const INTEREST: &str = ".gs_ai_one_int";

const PROFILE_NAME: &str = "#gsc_prf_in";
const PROFILE_AFFILIATION: &str = ".gsc_prf_il";
const PROFILE_INTEREST: &str = "a.gsc_prf_inta";
const PROFILE_CITATIONS: &str = "#gsc_rsb_st td.gsc_rsb_std";

fn create_selector(selector: &str) -> Result<Selector, HarvestError> {
    Selector::parse(selector)
        .map_err(|e| HarvestError::MalformedDocument(format!("bad selector {}: {}", selector, e)))
}

/// Whitespace-normalized text of an element.
fn element_text(elem: &ElementRef) -> String {
    elem.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first match under `scope`; `None` when absent or blank.
fn field_text(scope: &ElementRef, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .map(|elem| element_text(&elem))
        .find(|text| !text.is_empty())
}

struct CardSelectors {
    name: Selector,
    name_link: Selector,
    affiliation: Selector,
    email: Selector,
    cited_by: Selector,
    interest: Selector,
}

impl CardSelectors {
    fn new() -> Result<Self, HarvestError> {
        Ok(Self {
            name: create_selector(NAME)?,
            name_link: create_selector(NAME_LINK)?,
            affiliation: create_selector(AFFILIATION)?,
            email: create_selector(EMAIL)?,
            cited_by: create_selector(CITED_BY)?,
            interest: create_selector(INTEREST)?,
        })
    }
}

/// Name and absolute link of a card, read from the same anchor.
fn name_and_link(card: &ElementRef, selectors: &CardSelectors, base: &Url) -> (String, String) {
    match card.select(&selectors.name_link).next() {
        Some(anchor) => {
            let link = anchor
                .value()
                .attr("href")
                .map(|href| {
                    base.join(href)
                        .map(String::from)
                        .unwrap_or_else(|_| href.to_string())
                })
                .unwrap_or_default();
            (element_text(&anchor), link)
        }
        None => (
            field_text(card, &selectors.name).unwrap_or_default(),
            String::new(),
        ),
    }
}

fn parse_card(card: &ElementRef, selectors: &CardSelectors, base: &Url) -> ProfileRecord {
    let (name, profile_link) = name_and_link(card, selectors, base);

    let interests = card
        .select(&selectors.interest)
        .map(|elem| element_text(&elem))
        .filter(|text| !text.is_empty())
        .collect();

    ProfileRecord {
        name,
        profile_link,
        affiliation: field_text(card, &selectors.affiliation).unwrap_or_default(),
        email: field_text(card, &selectors.email).unwrap_or_default(),
        citation_metric: field_text(card, &selectors.cited_by).unwrap_or_default(),
        interests,
    }
}

/// Extract every author card of a search result page, in page order.
///
/// Relative profile links are resolved against `base`. Individual missing
/// fields come back empty; only a page without the results container is an
/// error ([`HarvestError::MalformedDocument`]).
pub fn extract_records(document: &Html, base: &Url) -> Result<Vec<ProfileRecord>, HarvestError> {
    let container_selector = create_selector(RESULTS_CONTAINER)?;
    let card_selector = create_selector(RESULT_CARD)?;
    let selectors = CardSelectors::new()?;

    let container = document.select(&container_selector).next().ok_or_else(|| {
        HarvestError::MalformedDocument(format!("missing results container {}", RESULTS_CONTAINER))
    })?;

    Ok(container
        .select(&card_selector)
        .map(|card| parse_card(&card, &selectors, base))
        .collect())
}

/// Extract the header of an individual profile page.
pub fn extract_profile_details(
    document: &Html,
    user_id: &str,
) -> Result<ProfileDetails, HarvestError> {
    let root = document.root_element();

    let name = field_text(&root, &create_selector(PROFILE_NAME)?).ok_or_else(|| {
        HarvestError::MalformedDocument(format!("missing profile name {}", PROFILE_NAME))
    })?;

    let interests = root
        .select(&create_selector(PROFILE_INTEREST)?)
        .map(|elem| element_text(&elem))
        .filter(|text| !text.is_empty())
        .collect();

    let citations = field_text(&root, &create_selector(PROFILE_CITATIONS)?)
        .as_deref()
        .and_then(parse_count);

    Ok(ProfileDetails {
        user_id: user_id.to_string(),
        name,
        affiliation: field_text(&root, &create_selector(PROFILE_AFFILIATION)?).unwrap_or_default(),
        interests,
        citations,
    })
}
