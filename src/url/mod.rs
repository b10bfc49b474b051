//! URL handling module for Catalog-Crawler
//!
//! This module provides link resolution against the catalog origin, search
//! URL construction, and product identifier extraction from item URLs.

mod identifier;
mod resolve;

use crate::config::TargetConfig;
use crate::UrlError;
use url::Url;

// Re-export main functions
pub use identifier::IdentifierPattern;
pub use resolve::{resolve_link, search_url};

/// A fully parsed crawl target
///
/// Built once from a [`TargetConfig`] so that a malformed base URL or
/// identifier pattern is reported before any request is made.
#[derive(Debug, Clone)]
pub struct CatalogTarget {
    /// Origin that relative links are resolved against
    pub base: Url,

    /// Search path template containing a `{term}` placeholder
    pub search_path: String,

    /// Substring identifying item links on search pages
    pub item_marker: String,

    /// Pattern that extracts the identifier from a resolved item URL
    pub id_pattern: IdentifierPattern,
}

impl CatalogTarget {
    /// Parses a target configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The target section of the crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(CatalogTarget)` - Base URL and identifier pattern are usable
    /// * `Err(UrlError)` - The base URL or pattern is malformed
    pub fn from_config(config: &TargetConfig) -> Result<Self, UrlError> {
        let base = Url::parse(&config.base_url).map_err(|e| UrlError::Parse(e.to_string()))?;

        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(UrlError::InvalidScheme(format!(
                "Only HTTP and HTTPS schemes are supported, got: {}",
                base.scheme()
            )));
        }

        Ok(Self {
            base,
            search_path: config.search_path.clone(),
            item_marker: config.item_marker.clone(),
            id_pattern: IdentifierPattern::new(&config.id_pattern)?,
        })
    }

    /// Builds the search URL for a term
    pub fn search_url(&self, term: &str) -> Result<Url, UrlError> {
        search_url(&self.base, &self.search_path, term)
    }

    /// Resolves an item link against the catalog origin
    pub fn resolve(&self, href: &str) -> Option<Url> {
        resolve_link(href, &self.base)
    }
}
