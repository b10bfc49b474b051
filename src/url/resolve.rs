use crate::UrlError;
use url::Url;

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
///
/// # Examples
///
/// ```
/// use catalog_crawler::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://shop.example.com").unwrap();
/// let url = resolve_link("/tv/p/abc123/", &base).unwrap();
/// assert_eq!(url.as_str(), "https://shop.example.com/tv/p/abc123/");
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url)
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

/// Builds the search URL for a term from a path template
///
/// The template is rooted at the origin of `base_url`. The `{term}`
/// placeholder is replaced by the search term as a single percent-encoded
/// path segment, so spaces and slashes in the term cannot change the path
/// structure. A trailing slash in the template is preserved.
///
/// # Examples
///
/// ```
/// use catalog_crawler::url::search_url;
/// use url::Url;
///
/// let base = Url::parse("https://shop.example.com").unwrap();
/// let url = search_url(&base, "/busca/{term}/", "smart tv").unwrap();
/// assert_eq!(url.as_str(), "https://shop.example.com/busca/smart%20tv/");
/// ```
pub fn search_url(base_url: &Url, template: &str, term: &str) -> Result<Url, UrlError> {
    let mut url = base_url.clone();
    url.set_query(None);
    url.set_fragment(None);

    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| UrlError::CannotBeABase(base_url.to_string()))?;
        segments.clear();

        for part in template.trim_start_matches('/').split('/') {
            if part == "{term}" {
                segments.push(term);
            } else {
                segments.push(part);
            }
        }
    }

    Ok(url)
}
