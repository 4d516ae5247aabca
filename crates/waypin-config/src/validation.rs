// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints that serde attributes cannot express, such as
//! usable provider URLs, non-empty paths, and sane numeric ranges.

use crate::diagnostic::ConfigError;
use crate::model::WaypinConfig;

/// Upper bound on candidates requested from the primary geocoder.
const MAX_GEOCODE_LIMIT: u32 = 50;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &WaypinConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let host = config.gateway.host.trim();
    if host.is_empty() {
        fail("gateway.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "gateway.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    for (key, url) in [
        ("geocode.primary_url", &config.geocode.primary_url),
        ("geocode.secondary_url", &config.geocode.secondary_url),
        ("storage.avatar_base_url", &config.storage.avatar_base_url),
    ] {
        if !is_http_url(url) {
            fail(format!("{key} must be an http(s) URL, got `{url}`"));
        }
    }

    if config.geocode.user_agent.trim().is_empty() {
        fail("geocode.user_agent must not be empty".to_string());
    }

    if config.geocode.limit == 0 || config.geocode.limit > MAX_GEOCODE_LIMIT {
        fail(format!(
            "geocode.limit must be between 1 and {MAX_GEOCODE_LIMIT}, got {}",
            config.geocode.limit
        ));
    }

    if config.geocode.timeout_secs == 0 {
        fail("geocode.timeout_secs must be at least 1".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.storage.avatar_dir.trim().is_empty() {
        fail("storage.avatar_dir must not be empty".to_string());
    }

    if config.sync.search_debounce_ms == 0 {
        fail("sync.search_debounce_ms must be at least 1".to_string());
    }

    if config.sync.min_query_chars == 0 {
        fail("sync.min_query_chars must be at least 1".to_string());
    }

    if config.sync.event_buffer == 0 {
        fail("sync.event_buffer must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    rest.is_some_and(|r| !r.is_empty() && !r.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = WaypinConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = WaypinConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "database_path"));
    }

    #[test]
    fn non_http_provider_url_fails_validation() {
        let mut config = WaypinConfig::default();
        config.geocode.secondary_url = "ftp://photon.example".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "geocode.secondary_url"));
    }

    #[test]
    fn blank_user_agent_fails_validation() {
        let mut config = WaypinConfig::default();
        config.geocode.user_agent = "   ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "user_agent"));
    }

    #[test]
    fn collects_every_error() {
        let mut config = WaypinConfig::default();
        config.geocode.limit = 0;
        config.sync.search_debounce_ms = 0;
        config.sync.min_query_chars = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(has_error(&errors, "geocode.limit"));
        assert!(has_error(&errors, "search_debounce_ms"));
        assert!(has_error(&errors, "min_query_chars"));
    }

    #[test]
    fn invalid_host_fails_validation() {
        let mut config = WaypinConfig::default();
        config.gateway.host = "not a host!".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "gateway.host"));
    }

    #[test]
    fn http_url_check() {
        assert!(is_http_url("https://nominatim.openstreetmap.org/search"));
        assert!(is_http_url("http://127.0.0.1:8080"));
        assert!(!is_http_url("https://"));
        assert!(!is_http_url("nominatim.openstreetmap.org"));
    }
}
