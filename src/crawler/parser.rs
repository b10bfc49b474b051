//! HTML parser for extracting item links from search result pages
//!
//! Only anchor targets are read. An anchor counts as an item link when its
//! `href` contains the catalog's item marker (for example `/p/`).

use crate::crawler::types::CandidateLink;
use scraper::{Html, Selector};
use std::collections::HashSet;

/// Extracts the distinct item links from a search result page
///
/// Links are returned as written in the page (relative or absolute), in
/// first-encounter order, with duplicates removed.
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `item_marker` - Substring an href must contain to be kept
///
/// # Example
///
/// ```
/// use catalog_crawler::crawler::extract_item_links;
///
/// let html = r#"<a href="/tv/p/abc/">TV</a><a href="/ajuda/">Help</a><a href="/tv/p/abc/">TV</a>"#;
/// let links = extract_item_links(html, "/p/");
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "/tv/p/abc/");
/// ```
pub fn extract_item_links(html: &str, item_marker: &str) -> Vec<CandidateLink> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        if !href.contains(item_marker) {
            continue;
        }

        if seen.insert(href.to_string()) {
            links.push(CandidateLink::new(href));
        }
    }

    links
}
