// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-account health record owned by the pool.

use chrono::{DateTime, Utc};
use serde::Serialize;

use intervox_config::model::AccountConfig;

/// Mutable health state for one credentialed provider account.
///
/// Only [`ProviderPool`](crate::ProviderPool) holds these; everything else
/// sees an [`AccountStatus`] snapshot.
#[derive(Debug, Clone)]
pub(crate) struct Account {
    pub(crate) name: String,
    token: String,
    pub(crate) is_active: bool,
    pub(crate) error_count: u32,
    pub(crate) last_used: Option<DateTime<Utc>>,
    /// Monotonic use counter; orders accounts by recency without relying on
    /// wall-clock resolution. `None` until first use.
    pub(crate) last_use_seq: Option<u64>,
}

impl Account {
    pub(crate) fn from_config(config: &AccountConfig) -> Self {
        Self {
            name: config.name.clone(),
            token: config.token.clone(),
            is_active: true,
            error_count: 0,
            last_used: None,
            last_use_seq: None,
        }
    }

    pub(crate) fn has_token(&self) -> bool {
        !self.token.trim().is_empty()
    }

    pub(crate) fn is_eligible(&self, threshold: u32) -> bool {
        self.is_active && self.has_token() && self.error_count < threshold
    }

    pub(crate) fn mark_used(&mut self, seq: u64) {
        self.last_used = Some(Utc::now());
        self.last_use_seq = Some(seq);
    }

    /// Records a failure. Returns `true` when this failure disabled the account.
    pub(crate) fn mark_error(&mut self, threshold: u32) -> bool {
        self.error_count = self.error_count.saturating_add(1);
        if self.error_count >= threshold && self.is_active {
            self.is_active = false;
            return true;
        }
        false
    }

    pub(crate) fn reset(&mut self) {
        self.error_count = 0;
        self.is_active = true;
    }

    pub(crate) fn status(&self) -> AccountStatus {
        AccountStatus {
            name: self.name.clone(),
            is_active: self.is_active,
            error_count: self.error_count,
            last_used: self.last_used,
            has_token: self.has_token(),
        }
    }
}

/// Read-only snapshot of one account, safe to hand to operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountStatus {
    pub name: String,
    pub is_active: bool,
    pub error_count: u32,
    pub last_used: Option<DateTime<Utc>>,
    pub has_token: bool,
}

impl AccountStatus {
    /// Whether the account can take a call.
    pub fn is_usable(&self) -> bool {
        self.is_active && self.has_token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(token: &str) -> Account {
        Account::from_config(&AccountConfig {
            name: "ACCOUNT_1".to_string(),
            token: token.to_string(),
            workflow_id: None,
            assistant_id: None,
        })
    }

    #[test]
    fn third_error_disables() {
        let mut a = account("tok");
        assert!(!a.mark_error(3));
        assert!(!a.mark_error(3));
        assert!(a.mark_error(3));
        assert!(!a.is_active);
        assert!(!a.is_eligible(3));
        // Further failures do not report a second disablement.
        assert!(!a.mark_error(3));
        assert_eq!(a.error_count, 4);
    }

    #[test]
    fn blank_token_never_eligible() {
        let a = account("   ");
        assert!(!a.has_token());
        assert!(!a.is_eligible(3));
    }

    #[test]
    fn reset_restores_eligibility() {
        let mut a = account("tok");
        for _ in 0..3 {
            a.mark_error(3);
        }
        a.reset();
        assert_eq!((a.error_count, a.is_active), (0, true));
        assert!(a.is_eligible(3));
    }

    #[test]
    fn status_hides_token() {
        let mut a = account("secret-token");
        a.mark_used(1);
        let status = a.status();
        assert!(status.has_token);
        assert!(status.last_used.is_some());
        let json = serde_json::to_string(&status).unwrap();
        assert!(!json.contains("secret-token"));
    }
}
