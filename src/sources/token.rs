//! Continuation-token discovery.
//!
//! Scholar does not link the next page. The "next" button carries an inline
//! `onclick` script whose URL is JavaScript-escaped, so the token sits between
//! the literal text `after_author\x3d` and the next `\x26`:
//!
//! ```text
//! window.location='/citations?view_op\x3dsearch_authors\x26hl\x3den\x26after_author\x3dT1_AAA\x26astart\x3d10'
//! ```
//!
//! Missing button, missing attribute or no match all mean the same thing: this is
//! the last page.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;

/// Pagination control holding the next-page script.
const NEXT_BUTTON_SELECTOR: &str = "button.gs_btnPR";

fn token_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"after_author\\x3d(.*?)\\x26").ok())
        .as_ref()
}

/// Extract the token between `after_author\x3d` and the following `\x26`.
///
/// Returns `None` when the delimiters are absent or enclose nothing.
pub fn parse_continuation_token(script: &str) -> Option<String> {
    let captures = token_pattern()?.captures(script)?;
    let token = captures.get(1)?.as_str();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

/// Find the next-page button in `document` and read its token.
pub fn resolve_continuation_token(document: &Html) -> Option<String> {
    let selector = Selector::parse(NEXT_BUTTON_SELECTOR).ok()?;
    let button = document.select(&selector).next()?;
    let script = button.value().attr("onclick")?;
    parse_continuation_token(script)
}
