// SPDX-FileCopyrightText: 2026 Ordesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as valid bind hosts, non-empty paths, and coherent CRM settings.

use crate::diagnostic::ConfigError;
use crate::model::OrdeskConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &OrdeskConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        fail(format!(
            "service.log_level `{}` must be one of {}",
            config.service.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

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

    if let Some(token) = &config.gateway.bearer_token
        && token.trim().is_empty()
    {
        fail("gateway.bearer_token must not be blank when set".to_string());
    }

    if config.assignment.cursor_name.trim().is_empty() {
        fail("assignment.cursor_name must not be empty".to_string());
    }

    if config.chat.channel_timeout_ms == 0 {
        fail("chat.channel_timeout_ms must be greater than 0".to_string());
    }

    if config.chat.placeholder_prefix.is_empty() {
        fail("chat.placeholder_prefix must not be empty".to_string());
    }

    if config.crm.enabled {
        match config.crm.webhook_url.as_deref() {
            None | Some("") => {
                fail("crm.webhook_url is required when crm.enabled = true".to_string())
            }
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                fail(format!("crm.webhook_url `{url}` must be an http(s) URL"))
            }
            Some(_) => {}
        }
    }

    if config.crm.timeout_secs == 0 {
        fail("crm.timeout_secs must be greater than 0".to_string());
    }

    if config.checkout.max_items == 0 {
        fail("checkout.max_items must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
