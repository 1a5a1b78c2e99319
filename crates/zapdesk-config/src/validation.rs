// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid bind addresses, identifier-safe table names,
//! and unique channel ids.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::ZapdeskConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ZapdeskConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate host is not empty
    if config.server.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    }

    // Validate host looks like a valid IP or hostname
    if !config.server.host.trim().is_empty() {
        let addr = config.server.host.trim();
        let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{addr}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.server.port == 0 {
        errors.push(ConfigError::Validation {
            message: "server.port must not be 0".to_string(),
        });
    }

    // Validate database_path is not empty
    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.media.download_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "media.download_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.media.max_bytes < 1024 {
        errors.push(ConfigError::Validation {
            message: format!(
                "media.max_bytes must be at least 1024, got {}",
                config.media.max_bytes
            ),
        });
    }

    // Validate channel entries
    let mut seen_ids = HashSet::new();
    for (i, channel) in config.channels.iter().enumerate() {
        if channel.id.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("channels[{i}].id must not be empty"),
            });
            continue;
        }

        if !valid_identifier(&channel.id) {
            errors.push(ConfigError::Validation {
                message: format!(
                    "channels[{i}].id `{}` may only contain letters, digits, `_` and `-`",
                    channel.id
                ),
            });
        }

        // Table names are interpolated into SQL; restrict to identifier chars.
        if !channel.table.is_empty() && !valid_identifier(&channel.table) {
            errors.push(ConfigError::Validation {
                message: format!(
                    "channels[{i}].table `{}` may only contain letters, digits, `_` and `-`",
                    channel.table
                ),
            });
        }

        if channel.agent_label.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("channels[{i}].agent_label must not be empty"),
            });
        }

        if !seen_ids.insert(&channel.id) {
            errors.push(ConfigError::Validation {
                message: format!(
                    "duplicate channel id `{}` in [[channels]] array",
                    channel.id
                ),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn valid_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
