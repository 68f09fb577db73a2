// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pool health summaries, operator recommendations, and periodic status logging.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use strum::{Display, EnumString};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::account::AccountStatus;
use crate::pool::ProviderPool;

/// Aggregate counts over the account table.
///
/// Slots without a token never take calls, so they count toward `total`
/// only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PoolSummary {
    pub total: usize,
    /// Accounts that can take a call: active and holding a token.
    pub active: usize,
    pub with_tokens: usize,
    /// Usable accounts with no recorded errors.
    pub healthy: usize,
    /// Usable accounts with some errors, still below the threshold.
    pub degraded: usize,
    /// Accounts with a token that have been disabled.
    pub failed: usize,
}

impl PoolSummary {
    pub fn from_status(status: &[AccountStatus], threshold: u32) -> Self {
        let usable: Vec<_> = status.iter().filter(|a| a.is_usable()).collect();
        Self {
            total: status.len(),
            active: usable.len(),
            with_tokens: status.iter().filter(|a| a.has_token).count(),
            healthy: usable.iter().filter(|a| a.error_count == 0).count(),
            degraded: usable
                .iter()
                .filter(|a| a.error_count > 0 && a.error_count < threshold)
                .count(),
            failed: status.iter().filter(|a| a.has_token && !a.is_active).count(),
        }
    }

    /// At least one account is active and holds a token.
    pub fn is_healthy(&self) -> bool {
        self.active > 0
    }

    pub fn recommendation(&self) -> Recommendation {
        if self.active == 0 {
            Recommendation::Critical
        } else if self.healthy == 0 {
            Recommendation::AllErrored
        } else if self.degraded > 0 {
            Recommendation::Degraded
        } else {
            Recommendation::Healthy
        }
    }
}

/// Operator advice derived from a [`PoolSummary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Critical,
    AllErrored,
    Degraded,
    Healthy,
}

impl Recommendation {
    pub fn message(&self) -> &'static str {
        match self {
            Recommendation::Critical => {
                "CRITICAL: no active provider accounts. Check the configured account tokens."
            }
            Recommendation::AllErrored => {
                "WARNING: all accounts have errors. Consider resetting error counts."
            }
            Recommendation::Degraded => "WARNING: some accounts have errors. Monitor closely.",
            Recommendation::Healthy => "HEALTHY: all provider accounts are working properly.",
        }
    }
}

/// Read-side view over a shared [`ProviderPool`].
#[derive(Clone)]
pub struct StatusMonitor {
    pool: Arc<ProviderPool>,
}

impl StatusMonitor {
    pub fn new(pool: Arc<ProviderPool>) -> Self {
        Self { pool }
    }

    pub async fn status(&self) -> Vec<AccountStatus> {
        self.pool.status().await
    }

    pub async fn summary(&self) -> PoolSummary {
        PoolSummary::from_status(&self.pool.status().await, self.pool.error_threshold())
    }

    pub async fn is_healthy(&self) -> bool {
        self.summary().await.is_healthy()
    }

    pub async fn recommendation(&self) -> Recommendation {
        self.summary().await.recommendation()
    }

    /// Resets one account's error count. Returns `false` for an unknown name.
    pub async fn reset_account(&self, name: &str) -> bool {
        let found = self.pool.reset_error_count(name).await;
        if found {
            info!(account = %name, "account reset by operator");
        } else {
            warn!(account = %name, "reset requested for unknown account");
        }
        found
    }

    /// Logs pool status every `interval` until `cancel` fires.
    ///
    /// The first report is emitted immediately.
    pub async fn run_monitor(&self, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        info!(interval_secs = interval.as_secs(), "pool status monitor started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("pool status monitor stopped");
                    return;
                }
                _ = ticker.tick() => {
                    self.log_status().await;
                }
            }
        }
    }

    async fn log_status(&self) {
        let status = self.pool.status().await;
        let summary = PoolSummary::from_status(&status, self.pool.error_threshold());

        for account in &status {
            debug!(
                account = %account.name,
                active = account.is_active,
                errors = account.error_count,
                has_token = account.has_token,
                last_used = ?account.last_used,
                "account status"
            );
        }

        let recommendation = summary.recommendation();
        match recommendation {
            Recommendation::Healthy => info!(
                total = summary.total,
                active = summary.active,
                healthy = summary.healthy,
                "{}",
                recommendation.message()
            ),
            _ => warn!(
                total = summary.total,
                active = summary.active,
                healthy = summary.healthy,
                degraded = summary.degraded,
                failed = summary.failed,
                "{}",
                recommendation.message()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(name: &str, active: bool, errors: u32, token: bool) -> AccountStatus {
        AccountStatus {
            name: name.to_string(),
            is_active: active,
            error_count: errors,
            last_used: None,
            has_token: token,
        }
    }

    #[test]
    fn summary_counts() {
        let summary = PoolSummary::from_status(
            &[
                status("A", true, 0, true),
                status("B", true, 2, true),
                status("C", false, 3, true),
                status("D", true, 0, false),
            ],
            3,
        );
        assert_eq!(
            summary,
            PoolSummary {
                total: 4,
                active: 2,
                with_tokens: 3,
                healthy: 1,
                degraded: 1,
                failed: 1,
            }
        );
        assert!(summary.is_healthy());
        assert_eq!(summary.recommendation(), Recommendation::Degraded);
    }

    #[test]
    fn recommendation_ladder() {
        let none_active = PoolSummary::from_status(&[status("A", false, 3, true)], 3);
        assert_eq!(none_active.recommendation(), Recommendation::Critical);
        assert!(!none_active.is_healthy());

        let all_errored = PoolSummary::from_status(&[status("A", true, 1, true)], 3);
        assert_eq!(all_errored.recommendation(), Recommendation::AllErrored);

        let healthy = PoolSummary::from_status(&[status("A", true, 0, true)], 3);
        assert_eq!(healthy.recommendation(), Recommendation::Healthy);
    }

    #[test]
    fn tokenless_slots_do_not_count_as_healthy() {
        let summary = PoolSummary::from_status(
            &[
                status("ACCOUNT_1", false, 3, true),
                status("ACCOUNT_2", true, 0, false),
                status("ACCOUNT_3", true, 0, false),
                status("ACCOUNT_4", true, 0, false),
            ],
            3,
        );
        assert_eq!(summary.active, 0);
        assert_eq!(summary.healthy, 0);
        assert_eq!(summary.failed, 1);
        assert!(!summary.is_healthy());
        assert_eq!(summary.recommendation(), Recommendation::Critical);
    }

    #[test]
    fn empty_pool_is_critical() {
        let summary = PoolSummary::from_status(&[], 3);
        assert_eq!(summary.recommendation(), Recommendation::Critical);
        assert!(summary.recommendation().message().starts_with("CRITICAL"));
    }

    #[test]
    fn recommendation_wire_names() {
        assert_eq!(Recommendation::AllErrored.to_string(), "all_errored");
        assert_eq!(
            serde_json::to_value(Recommendation::Healthy).unwrap(),
            serde_json::json!("healthy")
        );
    }
}
