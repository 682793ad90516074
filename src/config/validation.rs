use crate::config::types::{
    Config, CrawlerConfig, ExtractionConfig, FetchConfig, OutputConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetch_config(&config.fetch)?;
    validate_extraction_config(&config.extraction)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.start_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "start-url must use http or https, got '{}'",
            config.start_url
        )));
    }

    if config.max_workers < 1 || config.max_workers > 64 {
        return Err(ConfigError::Validation(format!(
            "max-workers must be between 1 and 64, got {}",
            config.max_workers
        )));
    }

    Ok(())
}

/// Validates HTTP request configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "request-timeout-ms must be > 0".to_string(),
        ));
    }

    if config.retry_count > 10 {
        return Err(ConfigError::Validation(format!(
            "retry-count must be <= 10, got {}",
            config.retry_count
        )));
    }

    Ok(())
}

/// Validates selector cascades and heuristics
fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    let required = [
        ("next-page-selectors", &config.next_page_selectors),
        ("title-selectors", &config.title_selectors),
        ("product-path-keywords", &config.product_path_keywords),
    ];
    for (name, list) in required {
        if list.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    let selector_lists = [
        &config.tile_selectors,
        &config.tile_title_selectors,
        &config.tile_price_selectors,
        &config.next_page_selectors,
        &config.title_selectors,
        &config.price_selectors,
        &config.image_selectors,
        &config.description_selectors,
        &config.availability_selectors,
        &config.breadcrumb_selectors,
    ];
    for selector in selector_lists.into_iter().flatten() {
        validate_selector(selector)?;
    }

    if config.category_separator.is_empty() {
        return Err(ConfigError::Validation(
            "category-separator cannot be empty".to_string(),
        ));
    }

    for keyword in &config.category_keywords {
        if keyword.prefix.trim().is_empty() || keyword.label.trim().is_empty() {
            return Err(ConfigError::Validation(
                "category-keywords entries need a non-empty prefix and label".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidSelector {
            selector: selector.to_string(),
            message: format!("{:?}", e),
        })
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.basename.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output basename cannot be empty".to_string(),
        ));
    }

    if config.delimiter.len() != 1 || !config.delimiter.is_ascii() {
        return Err(ConfigError::Validation(format!(
            "delimiter must be a single ASCII character, got '{}'",
            config.delimiter
        )));
    }

    Ok(())
}
