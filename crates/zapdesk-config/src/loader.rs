// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./zapdesk.toml` > `~/.config/zapdesk/zapdesk.toml`
//! > `/etc/zapdesk/zapdesk.toml`, with environment variable overrides via the
//! `ZAPDESK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::ZapdeskConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/zapdesk/zapdesk.toml` (system-wide)
/// 3. `~/.config/zapdesk/zapdesk.toml` (user XDG config)
/// 4. `./zapdesk.toml` (local directory)
/// 5. `ZAPDESK_*` environment variables
pub fn load_config() -> Result<ZapdeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ZapdeskConfig::default()))
        .merge(Toml::file("/etc/zapdesk/zapdesk.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("zapdesk/zapdesk.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("zapdesk.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<ZapdeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ZapdeskConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ZapdeskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ZapdeskConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `ZAPDESK_SERVER_BEARER_TOKEN` must map
/// to `server.bearer_token`, not `server.bearer.token`. The `[[channels]]`
/// array has no env mapping; channels are file-only.
fn env_provider() -> Env {
    Env::prefixed("ZAPDESK_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        let mapped = key
            .as_str()
            .replacen("service_", "service.", 1)
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("media_", "media.", 1);
        mapped.into()
    })
}
