// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./intervox.toml` > `~/.config/intervox/intervox.toml` > `/etc/intervox/intervox.toml`
//! with environment variable overrides via `INTERVOX_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::IntervoxConfig;

/// Sections that accept scalar overrides from `INTERVOX_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &["agent", "pool", "session", "fallback", "api", "gateway"];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/intervox/intervox.toml` (system-wide)
/// 3. `~/.config/intervox/intervox.toml` (user XDG config)
/// 4. `./intervox.toml` (local directory)
/// 5. `INTERVOX_*` environment variables
pub fn load_config() -> Result<IntervoxConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<IntervoxConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(IntervoxConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<IntervoxConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(IntervoxConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(IntervoxConfig::default()))
        .merge(Toml::file("/etc/intervox/intervox.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("intervox/intervox.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("intervox.toml"))
        .merge(env_provider())
}

/// Maps `INTERVOX_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `INTERVOX_SESSION_FALLBACK_TIMEOUT_SECS` maps to
/// `session.fallback_timeout_secs`. Variables outside the known sections
/// (notably the `INTERVOX_PROVIDER_*` account slots) are filtered out so they
/// never trip `deny_unknown_fields`.
pub fn map_env_key(key: &str) -> Option<String> {
    let key = key.to_ascii_lowercase();
    ENV_SECTIONS.iter().find_map(|section| {
        key.strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
            .filter(|rest| !rest.is_empty())
            .map(|rest| format!("{section}.{rest}"))
    })
}

fn env_provider() -> Env {
    Env::prefixed("INTERVOX_")
        .filter(|key| map_env_key(key.as_str()).is_some())
        .map(|key| {
            map_env_key(key.as_str())
                .unwrap_or_else(|| key.as_str().to_string())
                .into()
        })
}
