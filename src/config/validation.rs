use crate::config::types::Config;
use crate::ConfigError;
use url::Url;

/// Validates the whole configuration: `base_url` XOR `urls_list`, positive
/// timeout, non-negative rate controls, a sane retry ceiling, and a
/// parseable proxy URL if one was given.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let has_base = config.base_url.is_some();
    let has_urls_list = !config.urls_list.is_empty();
    if has_base == has_urls_list {
        return Err(ConfigError::Validation(
            "exactly one of base_url or urls_list must be set".to_string(),
        ));
    }

    if config.timeout <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "timeout must be > 0, got {}",
            config.timeout
        )));
    }

    if config.delay < 0.0 {
        return Err(ConfigError::Validation(format!(
            "delay must be >= 0, got {}",
            config.delay
        )));
    }

    if config.max_retries < 3 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 3, got {}",
            config.max_retries
        )));
    }

    if let Some(proxy) = &config.proxy {
        Url::parse(proxy).map_err(|e| ConfigError::InvalidUrl(format!("invalid proxy '{proxy}': {e}")))?;
    }

    if let Some(base_url) = &config.base_url {
        Url::parse(base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("invalid base_url '{base_url}': {e}")))?;
    }
    for seed in &config.urls_list {
        Url::parse(seed).map_err(|e| ConfigError::InvalidUrl(format!("invalid seed URL '{seed}': {e}")))?;
    }

    Ok(())
}
