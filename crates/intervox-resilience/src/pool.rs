// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider account pool with selection, failover, and failure accounting.
//!
//! The pool owns the account table behind a short-lived async mutex. The lock
//! is never held while a caller's operation runs, so concurrent calls can fail
//! over independently while still seeing each other's error counts.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use intervox_config::model::AccountConfig;
use intervox_core::{CallBackend, IntervoxError};

use crate::account::{Account, AccountStatus};

/// Consecutive-failure count at which an account is taken out of rotation.
pub const DEFAULT_ERROR_THRESHOLD: u32 = 3;

/// Builds the live backend handle for one configured account.
///
/// A failure here deactivates the account for the lifetime of the pool (until
/// an explicit reset, which restores eligibility but not the missing handle).
pub trait BackendFactory: Send + Sync {
    fn create(&self, account: &AccountConfig) -> Result<Arc<dyn CallBackend>, IntervoxError>;
}

impl<F> BackendFactory for F
where
    F: Fn(&AccountConfig) -> Result<Arc<dyn CallBackend>, IntervoxError> + Send + Sync,
{
    fn create(&self, account: &AccountConfig) -> Result<Arc<dyn CallBackend>, IntervoxError> {
        self(account)
    }
}

/// Pool of credentialed call-provider accounts.
///
/// Construct once at startup and share behind an `Arc`.
pub struct ProviderPool {
    accounts: Mutex<Vec<Account>>,
    handles: HashMap<String, Arc<dyn CallBackend>>,
    threshold: u32,
    use_seq: AtomicU64,
}

impl ProviderPool {
    /// Creates a pool with the default error threshold.
    pub fn new(accounts: &[AccountConfig], factory: &dyn BackendFactory) -> Self {
        Self::with_threshold(accounts, DEFAULT_ERROR_THRESHOLD, factory)
    }

    /// Creates a pool, building one handle per active account with a token.
    pub fn with_threshold(
        accounts: &[AccountConfig],
        threshold: u32,
        factory: &dyn BackendFactory,
    ) -> Self {
        let threshold = threshold.max(1);
        let mut table = Vec::with_capacity(accounts.len());
        let mut handles = HashMap::new();

        for config in accounts {
            let mut account = Account::from_config(config);
            if account.has_token() {
                match factory.create(config) {
                    Ok(handle) => {
                        handles.insert(account.name.clone(), handle);
                    }
                    Err(e) => {
                        warn!(account = %account.name, error = %e, "backend construction failed, deactivating account");
                        account.is_active = false;
                    }
                }
            } else {
                debug!(account = %account.name, "account has no token, never eligible");
            }
            table.push(account);
        }

        info!(
            configured = table.len(),
            live = handles.len(),
            threshold,
            "provider pool initialized"
        );

        Self {
            accounts: Mutex::new(table),
            handles,
            threshold,
            use_seq: AtomicU64::new(0),
        }
    }

    /// Error count at which accounts are disabled.
    pub fn error_threshold(&self) -> u32 {
        self.threshold
    }

    /// Name of the account that would be chosen next, without marking it used.
    ///
    /// Lowest error count wins; ties go to the never-used or least recently
    /// used account, then to configured order.
    pub async fn select_best_account(&self) -> Option<String> {
        let table = self.accounts.lock().await;
        best_index(&table, self.threshold).map(|i| table[i].name.clone())
    }

    /// Selects the best account, marks it used, and returns its handle.
    pub async fn acquire_handle(&self) -> Result<(String, Arc<dyn CallBackend>), IntervoxError> {
        let mut table = self.accounts.lock().await;
        let Some(index) = best_index(&table, self.threshold) else {
            error!("no eligible provider account");
            return Err(IntervoxError::AccountsExhausted);
        };

        let name = table[index].name.clone();
        let Some(handle) = self.handles.get(&name) else {
            return Err(IntervoxError::BackendUnavailable { account: name });
        };

        table[index].mark_used(self.next_seq());
        debug!(account = %name, "acquired provider handle");
        Ok((name, Arc::clone(handle)))
    }

    /// Runs `operation` against accounts until one succeeds.
    ///
    /// The `preferred` account goes first when it is eligible; the remaining
    /// eligible accounts follow in configured order. Every failed attempt
    /// counts against its account. Returns the first success, otherwise the
    /// last failure, or [`IntervoxError::AccountsExhausted`] when nothing was
    /// attempted.
    pub async fn execute_with_fallback<T, F, Fut>(
        &self,
        operation: F,
        preferred: Option<&str>,
    ) -> Result<T, IntervoxError>
    where
        F: Fn(String, Arc<dyn CallBackend>) -> Fut,
        Fut: Future<Output = Result<T, IntervoxError>>,
    {
        let mut attempted: Vec<String> = Vec::new();
        let mut last_error = None;

        while let Some((name, handle)) = self.next_attempt(preferred, &attempted).await {
            attempted.push(name.clone());
            match operation(name.clone(), handle).await {
                Ok(value) => {
                    debug!(account = %name, attempts = attempted.len(), "operation succeeded");
                    return Ok(value);
                }
                Err(e) => {
                    warn!(account = %name, error = %e, "operation failed, trying next account");
                    self.mark_error(&name).await;
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => {
                error!(attempts = attempted.len(), error = %e, "all provider accounts failed");
                Err(e)
            }
            None => {
                error!("no eligible provider account");
                Err(IntervoxError::AccountsExhausted)
            }
        }
    }

    /// Clears the error count and reactivates the account.
    ///
    /// Returns `false` (and changes nothing) for an unknown name.
    pub async fn reset_error_count(&self, name: &str) -> bool {
        let mut table = self.accounts.lock().await;
        match table.iter_mut().find(|a| a.name == name) {
            Some(account) => {
                account.reset();
                info!(account = %name, "account error count reset");
                true
            }
            None => false,
        }
    }

    /// Snapshot of every account in configured order.
    pub async fn status(&self) -> Vec<AccountStatus> {
        self.accounts.lock().await.iter().map(Account::status).collect()
    }

    pub(crate) async fn mark_error(&self, name: &str) {
        let mut table = self.accounts.lock().await;
        let Some(account) = table.iter_mut().find(|a| a.name == name) else {
            return;
        };
        if account.mark_error(self.threshold) {
            warn!(
                account = %name,
                errors = account.error_count,
                "account disabled after repeated failures"
            );
        } else {
            debug!(account = %name, errors = account.error_count, "account error recorded");
        }
    }

    /// Picks and marks the next account to try, skipping attempted ones.
    async fn next_attempt(
        &self,
        preferred: Option<&str>,
        attempted: &[String],
    ) -> Option<(String, Arc<dyn CallBackend>)> {
        let mut table = self.accounts.lock().await;
        let usable = |account: &Account| {
            account.is_eligible(self.threshold)
                && !attempted.contains(&account.name)
                && self.handles.contains_key(&account.name)
        };

        let index = preferred
            .and_then(|p| table.iter().position(|a| a.name == p && usable(a)))
            .or_else(|| table.iter().position(|a| usable(a)))?;

        let account = &mut table[index];
        account.mark_used(self.next_seq());
        let handle = self.handles.get(&account.name)?;
        Some((account.name.clone(), Arc::clone(handle)))
    }

    fn next_seq(&self) -> u64 {
        self.use_seq.fetch_add(1, Ordering::Relaxed) + 1
    }
}

fn best_index(table: &[Account], threshold: u32) -> Option<usize> {
    table
        .iter()
        .enumerate()
        .filter(|(_, a)| a.is_eligible(threshold))
        .min_by_key(|(i, a)| (a.error_count, a.last_use_seq.unwrap_or(0), *i))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stub::StubBackend;

    /// Minimal backend for unit tests; the full mock lives in intervox-test-utils.
    mod stub {
        use std::sync::Arc;

        use intervox_core::types::{AdapterType, AssistantConfig, CallVariables, HealthStatus};
        use intervox_core::{CallBackend, IntervoxError, PluginAdapter, StartedCall};
        use tokio::sync::mpsc;

        pub struct StubBackend {
            pub name: String,
        }

        impl StubBackend {
            pub fn arc(name: &str) -> Arc<dyn CallBackend> {
                Arc::new(Self {
                    name: name.to_string(),
                })
            }
        }

        #[async_trait::async_trait]
        impl PluginAdapter for StubBackend {
            fn name(&self) -> &str {
                &self.name
            }
            fn version(&self) -> semver::Version {
                semver::Version::new(0, 1, 0)
            }
            fn adapter_type(&self) -> AdapterType {
                AdapterType::CallBackend
            }
            async fn health_check(&self) -> Result<HealthStatus, IntervoxError> {
                Ok(HealthStatus::Healthy)
            }
        }

        #[async_trait::async_trait]
        impl CallBackend for StubBackend {
            async fn start(
                &self,
                _: &AssistantConfig,
                _: &CallVariables,
            ) -> Result<StartedCall, IntervoxError> {
                let (_, events) = mpsc::channel(1);
                Ok(StartedCall {
                    call_id: format!("{}-call", self.name),
                    events,
                })
            }
            fn stop(&self, _: &str) {}
        }
    }

    fn config(name: &str, token: &str) -> AccountConfig {
        AccountConfig {
            name: name.to_string(),
            token: token.to_string(),
            workflow_id: None,
            assistant_id: None,
        }
    }

    fn stub_factory(c: &AccountConfig) -> Result<Arc<dyn CallBackend>, IntervoxError> {
        Ok(StubBackend::arc(&c.name))
    }

    fn pool(names: &[&str]) -> ProviderPool {
        let accounts: Vec<_> = names.iter().map(|n| config(n, "tok")).collect();
        ProviderPool::new(&accounts, &stub_factory)
    }

    #[tokio::test]
    async fn select_prefers_never_used_then_configured_order() {
        let pool = pool(&["A", "B"]);
        assert_eq!(pool.select_best_account().await.as_deref(), Some("A"));
        pool.acquire_handle().await.unwrap();
        assert_eq!(pool.select_best_account().await.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn acquire_rotates_least_recently_used() {
        let pool = pool(&["A", "B", "C"]);
        let mut names = Vec::new();
        for _ in 0..4 {
            names.push(pool.acquire_handle().await.unwrap().0);
        }
        assert_eq!(names, ["A", "B", "C", "A"]);
    }

    #[tokio::test]
    async fn fewer_errors_beats_recency() {
        let pool = pool(&["A", "B"]);
        pool.acquire_handle().await.unwrap(); // A used
        pool.mark_error("B").await;
        assert_eq!(pool.select_best_account().await.as_deref(), Some("A"));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn disabling_an_account_logs_a_warning() {
        let pool = ProviderPool::with_threshold(&[config("A", "tok")], 2, &stub_factory);
        pool.mark_error("A").await;
        assert!(!logs_contain("account disabled after repeated failures"));
        pool.mark_error("A").await;
        assert!(logs_contain("account disabled after repeated failures"));
    }

    #[tokio::test]
    async fn disabled_sole_token_leaves_pool_unhealthy_despite_empty_slots() {
        let accounts = vec![
            config("ACCOUNT_1", "tok"),
            config("ACCOUNT_2", ""),
            config("ACCOUNT_3", ""),
            config("ACCOUNT_4", ""),
        ];
        let pool = Arc::new(ProviderPool::with_threshold(&accounts, 1, &stub_factory));
        let monitor = crate::StatusMonitor::new(Arc::clone(&pool));
        assert!(monitor.is_healthy().await);

        pool.mark_error("ACCOUNT_1").await;
        assert!(!monitor.is_healthy().await);
        assert_eq!(monitor.recommendation().await, crate::Recommendation::Critical);
        assert!(pool.acquire_handle().await.is_err());
    }

    #[tokio::test]
    async fn factory_failure_deactivates_account() {
        let accounts = vec![config("A", "tok"), config("B", "tok")];
        let factory = |c: &AccountConfig| -> Result<Arc<dyn CallBackend>, IntervoxError> {
            if c.name == "A" {
                Err(IntervoxError::provider("bad token format"))
            } else {
                Ok(StubBackend::arc(&c.name))
            }
        };
        let pool = ProviderPool::new(&accounts, &factory);
        let status = pool.status().await;
        assert!(!status[0].is_active);
        assert!(status[1].is_active);
        assert_eq!(pool.acquire_handle().await.unwrap().0, "B");
    }

    #[tokio::test]
    async fn reset_of_handleless_account_reports_unavailable() {
        let accounts = vec![config("A", "tok")];
        let factory = |_: &AccountConfig| -> Result<Arc<dyn CallBackend>, IntervoxError> {
            Err(IntervoxError::provider("boom"))
        };
        let pool = ProviderPool::new(&accounts, &factory);
        assert!(matches!(
            pool.acquire_handle().await,
            Err(IntervoxError::AccountsExhausted)
        ));
        assert!(pool.reset_error_count("A").await);
        assert!(matches!(
            pool.acquire_handle().await,
            Err(IntervoxError::BackendUnavailable { account }) if account == "A"
        ));
    }

    #[tokio::test]
    async fn empty_token_slot_is_listed_but_not_eligible() {
        let accounts = vec![config("ACCOUNT_1", ""), config("ACCOUNT_2", "tok")];
        let pool = ProviderPool::new(&accounts, &stub_factory);
        let status = pool.status().await;
        assert_eq!(status.len(), 2);
        assert!(!status[0].has_token);
        assert_eq!(pool.select_best_account().await.as_deref(), Some("ACCOUNT_2"));
    }

    #[tokio::test]
    async fn threshold_is_clamped_to_one() {
        let pool = ProviderPool::with_threshold(&[config("A", "tok")], 0, &stub_factory);
        assert_eq!(pool.error_threshold(), 1);
        pool.mark_error("A").await;
        assert!(pool.select_best_account().await.is_none());
    }

    #[tokio::test]
    async fn mark_error_unknown_name_is_noop() {
        let pool = pool(&["A"]);
        pool.mark_error("Z").await;
        assert_eq!(pool.status().await[0].error_count, 0);
    }
}
