// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./wisp.toml` > `~/.config/wisp/wisp.toml` >
//! `/etc/wisp/wisp.toml` with environment variable overrides via the
//! `WISP_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::WispConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/wisp/wisp.toml` (system-wide)
/// 3. `~/.config/wisp/wisp.toml` (user XDG config)
/// 4. `./wisp.toml` (local directory)
/// 5. `WISP_*` environment variables
pub fn load_config() -> Result<WispConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<WispConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WispConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<WispConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(WispConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for
/// diagnostic use). Returned before extraction so callers can inspect
/// metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(WispConfig::default()))
        .merge(Toml::file("/etc/wisp/wisp.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("wisp/wisp.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("wisp.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `WISP_WIDGET_WS_URL` must map to
/// `widget.ws_url`, not `widget.ws.url`.
fn env_provider() -> Env {
    Env::prefixed("WISP_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: WISP_WIDGET_WS_URL -> "widget_ws_url". Only the
        // leading section prefix becomes a dot; the rest of the key may
        // itself contain section names (widget_history_url).
        let key_str = key.as_str();
        for section in ["widget", "connection", "history", "typing", "client"] {
            if let Some(rest) = key_str.strip_prefix(section) {
                if let Some(field) = rest.strip_prefix('_') {
                    return format!("{section}.{field}").into();
                }
            }
        }
        key_str.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_yields_defaults() {
        let config = load_config_from_str("").expect("empty config is valid");
        assert_eq!(config.connection.max_attempts, 5);
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = load_config_from_str(
            r#"
[connection]
base_delay_ms = 500
"#,
        )
        .expect("valid TOML");
        assert_eq!(config.connection.base_delay_ms, 500);
        // Untouched keys keep their defaults.
        assert_eq!(config.connection.max_attempts, 5);
    }
}
