// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `intervox accounts` command implementation.

use intervox_config::model::{AccountConfig, IntervoxConfig};

/// One printable row. Tokens are reduced to whether one is set.
fn row(account: &AccountConfig) -> String {
    let token = if account.token.trim().is_empty() {
        "missing"
    } else {
        "set"
    };
    format!(
        "    {:<10} token: {:<8} workflow: {:<24} assistant: {}",
        account.name,
        token,
        account.workflow_id.as_deref().unwrap_or("-"),
        account.assistant_id.as_deref().unwrap_or("-"),
    )
}

fn render(accounts: &[AccountConfig]) -> Vec<String> {
    if accounts.is_empty() {
        return vec!["    no provider accounts configured".to_string()];
    }
    accounts.iter().map(row).collect()
}

/// Prints the accounts the pool would be built from.
pub fn run_accounts(config: &IntervoxConfig) {
    let accounts = intervox_config::resolve_accounts_from_env(config);
    println!();
    println!("  intervox accounts");
    println!("  {}", "-".repeat(35));
    for line in render(&accounts) {
        println!("{line}");
    }
    println!();
}
