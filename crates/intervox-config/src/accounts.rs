// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider account slots read from environment-style key/value pairs.
//!
//! Each slot `n` in `1..=ACCOUNT_SLOTS` is a triplet:
//!
//! - `INTERVOX_PROVIDER_TOKEN_<n>`
//! - `INTERVOX_PROVIDER_WORKFLOW_ID_<n>`
//! - `INTERVOX_PROVIDER_ASSISTANT_ID_<n>`
//!
//! When no slot carries a token, the unnumbered legacy triplet
//! (`INTERVOX_PROVIDER_TOKEN`, ...) takes the place of slot 1 under the name
//! [`LEGACY_ACCOUNT_NAME`].

use std::collections::HashMap;

use tracing::debug;

use crate::model::{AccountConfig, IntervoxConfig};

/// Number of numbered account slots.
pub const ACCOUNT_SLOTS: usize = 4;

/// Name given to the account built from the legacy unnumbered triplet.
pub const LEGACY_ACCOUNT_NAME: &str = "DEFAULT";

const TOKEN_KEY: &str = "INTERVOX_PROVIDER_TOKEN";
const WORKFLOW_KEY: &str = "INTERVOX_PROVIDER_WORKFLOW_ID";
const ASSISTANT_KEY: &str = "INTERVOX_PROVIDER_ASSISTANT_ID";

/// Builds the account slots from key/value pairs.
pub fn accounts_from_pairs<I, K, V>(pairs: I) -> Vec<AccountConfig>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let vars: HashMap<String, String> = pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();

    let non_empty = |key: &str| {
        vars.get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let mut accounts: Vec<AccountConfig> = (1..=ACCOUNT_SLOTS)
        .map(|slot| AccountConfig {
            name: format!("ACCOUNT_{slot}"),
            token: non_empty(&format!("{TOKEN_KEY}_{slot}")).unwrap_or_default(),
            workflow_id: non_empty(&format!("{WORKFLOW_KEY}_{slot}")),
            assistant_id: non_empty(&format!("{ASSISTANT_KEY}_{slot}")),
        })
        .collect();

    if !accounts.iter().any(AccountConfig::has_token) {
        debug!("no numbered provider tokens set, using legacy account triplet");
        accounts[0] = AccountConfig {
            name: LEGACY_ACCOUNT_NAME.to_string(),
            token: non_empty(TOKEN_KEY).unwrap_or_default(),
            workflow_id: non_empty(WORKFLOW_KEY),
            assistant_id: non_empty(ASSISTANT_KEY),
        };
    }

    accounts
}

/// Resolves the accounts the pool should manage.
///
/// Accounts declared in `[[accounts]]` win; otherwise the slots are read from
/// the given environment pairs.
pub fn resolve_accounts<I, K, V>(config: &IntervoxConfig, env: I) -> Vec<AccountConfig>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    if !config.accounts.is_empty() {
        return config.accounts.clone();
    }
    accounts_from_pairs(env)
}

/// Resolves the accounts from the process environment.
pub fn resolve_accounts_from_env(config: &IntervoxConfig) -> Vec<AccountConfig> {
    resolve_accounts(config, std::env::vars())
}
