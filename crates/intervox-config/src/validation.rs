// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes.
//! All errors are collected; validation never fails fast.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::IntervoxConfig;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &IntervoxConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.pool.error_threshold < 1 {
        fail("pool.error_threshold must be at least 1".to_string());
    }

    if config.pool.monitor_interval_secs == 0 {
        fail("pool.monitor_interval_secs must be greater than 0".to_string());
    }

    let mut seen_names = HashSet::new();
    for (i, account) in config.accounts.iter().enumerate() {
        if account.name.trim().is_empty() {
            fail(format!("accounts[{i}].name must not be empty"));
        } else if !seen_names.insert(account.name.as_str()) {
            fail(format!(
                "duplicate account name `{}` in [[accounts]] array",
                account.name
            ));
        }
    }

    if config.session.fallback_timeout_secs == 0 {
        fail("session.fallback_timeout_secs must be greater than 0".to_string());
    }

    if config.session.marker.trim().is_empty() {
        fail("session.marker must not be empty".to_string());
    }

    if config.session.extractors.is_empty() {
        fail("session.extractors must list at least one strategy".to_string());
    }

    let mut seen_extractors = HashSet::new();
    for kind in &config.session.extractors {
        if !seen_extractors.insert(kind) {
            fail(format!("session.extractors lists `{kind}` more than once"));
        }
    }

    if config.session.event_buffer == 0 {
        fail("session.event_buffer must be greater than 0".to_string());
    }

    let fallback = &config.fallback;
    for (key, value) in [
        ("type", &fallback.interview_type),
        ("role", &fallback.role),
        ("level", &fallback.level),
        ("techstack", &fallback.techstack),
    ] {
        if value.trim().is_empty() {
            fail(format!("fallback.{key} must not be empty"));
        }
    }
    if fallback.amount == 0 {
        fail("fallback.amount must be greater than 0".to_string());
    }

    for (key, url) in [
        ("api.app_base_url", &config.api.app_base_url),
        ("api.provider_base_url", &config.api.provider_base_url),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            fail(format!("{key} `{url}` must be an http(s) URL"));
        }
    }

    if config.api.request_timeout_secs == 0 {
        fail("api.request_timeout_secs must be greater than 0".to_string());
    }

    if config.gateway.host.trim().is_empty() {
        fail("gateway.host must not be empty".to_string());
    }

    if config
        .gateway
        .webhook_secret
        .as_deref()
        .is_some_and(|secret| secret.trim().is_empty())
    {
        fail("gateway.webhook_secret must not be blank when set".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
