//! Search page link discovery
//!
//! One call fetches one page of search results and returns the item links
//! found on it. A page that cannot be fetched yields no links, which the
//! pipeline treats as the end of the results.

use crate::crawler::fetcher::RetryingHttpClient;
use crate::crawler::parser::extract_item_links;
use crate::crawler::types::{CandidateLink, SearchQuery};
use crate::url::CatalogTarget;

/// Fetches search result pages and extracts item links
pub struct LinkDiscoverer<'a> {
    client: &'a RetryingHttpClient,
    target: &'a CatalogTarget,
}

impl<'a> LinkDiscoverer<'a> {
    pub fn new(client: &'a RetryingHttpClient, target: &'a CatalogTarget) -> Self {
        Self { client, target }
    }

    /// Query parameters selecting one page of results, cheapest first
    pub fn search_params(page: u32) -> Vec<(&'static str, String)> {
        vec![
            ("page", page.to_string()),
            ("sortOrientation", "asc".to_string()),
            ("sortType", "price".to_string()),
            ("bypass", "true".to_string()),
        ]
    }

    /// Returns the distinct item links on one search page
    ///
    /// Network failures (after the client's own retries) and non-success
    /// statuses produce an empty result rather than an error.
    pub async fn discover(&self, query: &SearchQuery, page: u32) -> Vec<CandidateLink> {
        let url = match self.target.search_url(query.term()) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Cannot build search URL for '{}': {}", query.term(), e);
                return Vec::new();
            }
        };

        let params = Self::search_params(page);
        tracing::debug!("Fetching search page {} from {}", page, url);

        match self.client.get(url.as_str(), &params).await {
            Ok(response) if response.is_success() => {
                let links = extract_item_links(&response.body, &self.target.item_marker);
                tracing::debug!("Search page {} yielded {} links", page, links.len());
                links
            }
            Ok(response) => {
                tracing::warn!(
                    "Search page {} returned HTTP {}, treating as end of results",
                    page,
                    response.status
                );
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(
                    "Search page {} failed, treating as end of results: {}",
                    page,
                    e
                );
                Vec::new()
            }
        }
    }
}
