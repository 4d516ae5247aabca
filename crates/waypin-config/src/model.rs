// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Waypin configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WaypinConfig {
    /// Application identity and logging.
    #[serde(default)]
    pub app: AppConfig,

    /// HTTP gateway bind settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Geocoding provider settings.
    #[serde(default)]
    pub geocode: GeocodeConfig,

    /// Backend storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Realtime sync and search settings.
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Application identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Display name used in logs and the health endpoint.
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_app_name() -> String {
    "waypin".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Geocoding provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeocodeConfig {
    /// Primary provider search endpoint (Nominatim response shape).
    #[serde(default = "default_primary_url")]
    pub primary_url: String,

    /// Fallback provider endpoint (Photon feature-collection shape).
    #[serde(default = "default_secondary_url")]
    pub secondary_url: String,

    /// Client-identifying `User-Agent`. The primary rejects anonymous traffic.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Language hint sent to both providers.
    #[serde(default = "default_language")]
    pub language: String,

    /// Maximum candidates requested from the primary.
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            primary_url: default_primary_url(),
            secondary_url: default_secondary_url(),
            user_agent: default_user_agent(),
            language: default_language(),
            limit: default_limit(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_primary_url() -> String {
    "https://nominatim.openstreetmap.org/search".to_string()
}

fn default_secondary_url() -> String {
    "https://photon.komoot.io/api/".to_string()
}

fn default_user_agent() -> String {
    format!("waypin/{}", env!("CARGO_PKG_VERSION"))
}

fn default_language() -> String {
    "en".to_string()
}

fn default_limit() -> u32 {
    5
}

fn default_timeout_secs() -> u64 {
    10
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

    /// Directory holding uploaded avatar objects.
    #[serde(default = "default_avatar_dir")]
    pub avatar_dir: String,

    /// Public base URL that avatar object names are appended to.
    #[serde(default = "default_avatar_base_url")]
    pub avatar_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            avatar_dir: default_avatar_dir(),
            avatar_base_url: default_avatar_base_url(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("waypin").join("waypin.db"))
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "waypin.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

fn default_avatar_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("waypin").join("avatars"))
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "avatars".to_string())
}

fn default_avatar_base_url() -> String {
    "http://127.0.0.1:3000/avatars".to_string()
}

/// Realtime sync and place-search configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Quiet period before a typed place query is sent.
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Queries shorter than this (after trimming) are never sent.
    #[serde(default = "default_min_query_chars")]
    pub min_query_chars: usize,

    /// Change-event buffer per subscriber before it is reported as lagged.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            search_debounce_ms: default_search_debounce_ms(),
            min_query_chars: default_min_query_chars(),
            event_buffer: default_event_buffer(),
        }
    }
}

fn default_search_debounce_ms() -> u64 {
    300
}

fn default_min_query_chars() -> usize {
    2
}

fn default_event_buffer() -> usize {
    256
}
