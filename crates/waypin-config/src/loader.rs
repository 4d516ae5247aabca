// SPDX-FileCopyrightText: 2026 Waypin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./waypin.toml` > `~/.config/waypin/waypin.toml` > `/etc/waypin/waypin.toml`
//! with environment variable overrides via `WAYPIN_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::WaypinConfig;

/// Config sections recognised in `WAYPIN_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &["app", "gateway", "geocode", "storage", "sync"];

/// Config files in merge order (later overrides earlier).
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/waypin/waypin.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("waypin/waypin.toml"));
    }
    paths.push(PathBuf::from("waypin.toml"));
    paths
}

/// Build the Figment used for config loading.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/waypin/waypin.toml` (system-wide)
/// 3. `~/.config/waypin/waypin.toml` (user XDG config)
/// 4. `./waypin.toml` (local directory)
/// 5. `WAYPIN_*` environment variables
pub fn build_figment() -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(WaypinConfig::default()));
    for path in config_paths() {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(env_provider())
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
pub fn load_config() -> Result<WaypinConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<WaypinConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WaypinConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<WaypinConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WaypinConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Environment provider mapping `WAYPIN_GEOCODE_USER_AGENT` to `geocode.user_agent`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// keys that themselves contain underscores survive intact.
fn env_provider() -> Env {
    Env::prefixed("WAYPIN_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_on_section_only() {
        assert_eq!(map_env_key("geocode_user_agent"), "geocode.user_agent");
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("sync_search_debounce_ms"), "sync.search_debounce_ms");
        assert_eq!(map_env_key("unknown_key"), "unknown_key");
    }

    #[test]
    fn local_file_is_merged_last() {
        let paths = config_paths();
        assert_eq!(paths.first(), Some(&PathBuf::from("/etc/waypin/waypin.toml")));
        assert_eq!(paths.last(), Some(&PathBuf::from("waypin.toml")));
    }
}
