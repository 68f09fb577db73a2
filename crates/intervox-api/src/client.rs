// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared HTTP client construction.

use std::time::Duration;

use intervox_core::IntervoxError;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

/// Builds a JSON client with the given per-request timeout and optional bearer token.
pub(crate) fn build_client(
    timeout: Duration,
    bearer_token: Option<&str>,
) -> Result<reqwest::Client, IntervoxError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(token) = bearer_token {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| IntervoxError::Config(format!("invalid provider token header value: {e}")))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|e| IntervoxError::Provider {
            message: format!("failed to build HTTP client: {e}"),
            source: Some(Box::new(e)),
        })
}

/// Joins a base URL and a path without doubling the slash.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}
