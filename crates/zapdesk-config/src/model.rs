// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Zapdesk service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Zapdesk configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values; a deployment only needs `[[channels]]` entries and a bearer
/// token to be usable.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ZapdeskConfig {
    /// Service-wide settings (logging).
    #[serde(default)]
    pub service: ServiceConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Media download settings.
    #[serde(default)]
    pub media: MediaConfig,

    /// Configured channels, one per upstream WhatsApp line / store.
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

/// Service-wide configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the gateway to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind the gateway to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token required on webhook and API requests.
    /// `None` rejects all requests (fail-closed).
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_token: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8810
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("zapdesk").join("zapdesk.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("zapdesk.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Media download configuration for the webhook boundary.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MediaConfig {
    /// Timeout for a single media fetch, in seconds.
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,

    /// Maximum accepted media body size in bytes. Larger responses are
    /// discarded and the message falls back to a placeholder.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            download_timeout_secs: default_download_timeout_secs(),
            max_bytes: default_max_bytes(),
        }
    }
}

fn default_download_timeout_secs() -> u64 {
    15
}

fn default_max_bytes() -> usize {
    16 * 1024 * 1024
}

/// One upstream channel (a store's WhatsApp line backed by its own table).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelConfig {
    /// Channel identifier used in URLs and derived conversation ids.
    #[serde(default)]
    pub id: String,

    /// Backing table name. Empty means "use the channel id".
    #[serde(default)]
    pub table: String,

    /// Human-readable channel title for the dashboard. Falls back to `id`.
    #[serde(default)]
    pub label: Option<String>,

    /// Role-hint values that mark a row as sent by our side. Compared
    /// case-insensitively; the vocabulary varies per upstream source.
    #[serde(default = "default_agent_hints")]
    pub agent_hints: Vec<String>,

    /// Display name shown for agent-side messages.
    #[serde(default = "default_agent_label")]
    pub agent_label: String,
}

impl ChannelConfig {
    /// The table this channel reads from and writes to.
    pub fn table_name(&self) -> &str {
        if self.table.is_empty() {
            &self.id
        } else {
            &self.table
        }
    }
}

fn default_agent_hints() -> Vec<String> {
    ["ai", "assistant", "atendente", "agent", "bot"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_agent_label() -> String {
    "atendente".to_string()
}
