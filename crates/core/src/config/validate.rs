use crate::formats::KNOWN_MEDIA;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - tracker URL and API key are non-empty
/// - at least one desired target format
/// - every configured media type is one the catalog knows
/// - announce URL present when publishing is enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.tracker.base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "tracker.base_url cannot be empty".to_string(),
        ));
    }

    if config.tracker.api_key.is_empty() {
        return Err(ConfigError::ValidationError(
            "tracker.api_key cannot be empty".to_string(),
        ));
    }

    if config.formats.desired.is_empty() {
        return Err(ConfigError::ValidationError(
            "formats.desired cannot be empty".to_string(),
        ));
    }

    if config.media.types.is_empty() {
        return Err(ConfigError::ValidationError(
            "media.types cannot be empty".to_string(),
        ));
    }

    for media in &config.media.types {
        if !KNOWN_MEDIA.contains(&media.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "unknown media type '{}' (known: {})",
                media,
                KNOWN_MEDIA.join(", ")
            )));
        }
    }

    if config.publish.enabled
        && config
            .tracker
            .announce_url
            .as_deref()
            .unwrap_or("")
            .is_empty()
    {
        return Err(ConfigError::ValidationError(
            "tracker.announce_url is required when publish.enabled is true".to_string(),
        ));
    }

    if config.encoder.concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "encoder.concurrency cannot be 0".to_string(),
        ));
    }

    // A zero page size would never terminate catalog pagination.
    if config.tracker.page_size == 0 {
        return Err(ConfigError::ValidationError(
            "tracker.page_size cannot be 0".to_string(),
        ));
    }

    Ok(())
}
