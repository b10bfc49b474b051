use crate::config::types::{Config, HttpConfig, OutputConfig, TargetConfig};
use crate::url::IdentifierPattern;
use crate::{ConfigError, UrlError};
use url::Url;

/// Upper bound for the retry backoff base, in seconds
pub const MAX_BACKOFF_FACTOR: f64 = 60.0;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_target_config(&config.target)?;
    validate_http_config(&config.http)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the crawl target
fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    if base.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' cannot be used to resolve links",
            config.base_url
        )));
    }

    if !config.search_path.contains("{term}") {
        return Err(ConfigError::Validation(format!(
            "search_path must contain a {{term}} placeholder, got '{}'",
            config.search_path
        )));
    }

    if config.item_marker.is_empty() {
        return Err(ConfigError::Validation(
            "item_marker cannot be empty".to_string(),
        ));
    }

    IdentifierPattern::new(&config.id_pattern).map_err(|e| match e {
        UrlError::InvalidPattern(message) => ConfigError::InvalidPattern(message),
        other => ConfigError::InvalidPattern(other.to_string()),
    })?;

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP client settings
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be between 0 and 10, got {}",
            config.max_retries
        )));
    }

    if !(0.0..=MAX_BACKOFF_FACTOR).contains(&config.backoff_factor) {
        return Err(ConfigError::Validation(format!(
            "backoff_factor must be between 0 and {}, got {}",
            MAX_BACKOFF_FACTOR, config.backoff_factor
        )));
    }

    for status in &config.retry_statuses {
        if !(500..=599).contains(status) {
            return Err(ConfigError::Validation(format!(
                "retry_statuses may only contain 5xx codes, got {}",
                status
            )));
        }
    }

    if config.max_redirects < 1 {
        return Err(ConfigError::Validation(
            "max_redirects must be >= 1, identifiers are read after redirects".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.file_prefix.is_empty() {
        return Err(ConfigError::Validation(
            "file_prefix cannot be empty".to_string(),
        ));
    }

    Ok(())
}
