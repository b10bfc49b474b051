use crate::UrlError;
use regex::Regex;

/// Compiled pattern locating a product identifier inside a URL
///
/// The identifier is the first capture group. A match only counts when the
/// captured text is non-empty and ASCII alphanumeric.
#[derive(Debug, Clone)]
pub struct IdentifierPattern {
    regex: Regex,
}

impl IdentifierPattern {
    /// Compiles an identifier pattern
    ///
    /// # Examples
    ///
    /// ```
    /// use catalog_crawler::url::IdentifierPattern;
    ///
    /// let pattern = IdentifierPattern::new(r"/p/([a-zA-Z0-9]+)/").unwrap();
    /// assert_eq!(
    ///     pattern.extract("https://shop.example.com/tv/p/ab12cd/et/tv/"),
    ///     Some("ab12cd".to_string())
    /// );
    /// ```
    pub fn new(pattern: &str) -> Result<Self, UrlError> {
        let regex = Regex::new(pattern)
            .map_err(|e| UrlError::InvalidPattern(format!("'{}': {}", pattern, e)))?;

        if regex.captures_len() < 2 {
            return Err(UrlError::InvalidPattern(format!(
                "'{}' has no capture group",
                pattern
            )));
        }

        Ok(Self { regex })
    }

    /// Extracts the identifier from a URL, if present
    pub fn extract(&self, url: &str) -> Option<String> {
        let id = self.regex.captures(url)?.get(1)?.as_str();

        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }

        Some(id.to_string())
    }

    /// Returns true if the URL carries an identifier
    pub fn matches(&self, url: &str) -> bool {
        self.extract(url).is_some()
    }

    /// The source text of the pattern
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}
