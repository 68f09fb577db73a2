// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a provider pool over mock backends, mock
//! persistence collaborators, a reconciler, and a call controller. Provides
//! `run_call()` to drive one call through the full pipeline in tests.

use std::sync::Arc;

use intervox_agent::{CallController, CallRegistry, CallRequest, CallSnapshot, Reconciler};
use intervox_config::model::{AccountConfig, IntervoxConfig};
use intervox_core::types::{CallEvent, CallOutcome, SessionId};
use intervox_core::{FeedbackStore, InterviewStore, IntervoxError};
use intervox_resilience::ProviderPool;
use tokio_util::sync::CancellationToken;

use crate::mock_backend::{MockBackend, MockBackendSet};
use crate::mock_store::{MockFeedbackStore, MockInterviewStore};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    accounts: Vec<AccountConfig>,
    backends: MockBackendSet,
    config: IntervoxConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            accounts: Vec::new(),
            backends: MockBackendSet::new(),
            config: IntervoxConfig::default(),
        }
    }

    /// Add accounts with a token each, in the given order.
    pub fn with_accounts(mut self, names: &[&str]) -> Self {
        self.accounts.extend(names.iter().map(|name| AccountConfig {
            name: (*name).to_string(),
            token: format!("token-{name}"),
            workflow_id: None,
            assistant_id: None,
        }));
        self
    }

    /// Add one account exactly as configured.
    pub fn with_account(mut self, account: AccountConfig) -> Self {
        self.accounts.push(account);
        self
    }

    /// Every backend emits `script` when a call starts on it.
    pub fn with_script(mut self, script: Vec<CallEvent>) -> Self {
        self.backends = self.backends.with_script(script);
        self
    }

    /// The named account's backend fails every start.
    pub fn with_failing_account(mut self, name: &str) -> Self {
        self.backends = self.backends.failing(name);
        self
    }

    pub fn with_fallback_timeout(mut self, secs: u64) -> Self {
        self.config.session.fallback_timeout_secs = secs;
        self
    }

    pub fn with_error_threshold(mut self, threshold: u32) -> Self {
        self.config.pool.error_threshold = threshold;
        self
    }

    /// Build the test harness. Defaults to accounts `ACCOUNT_1` and `ACCOUNT_2`.
    pub fn build(self) -> Result<TestHarness, IntervoxError> {
        let mut builder = self;
        if builder.accounts.is_empty() {
            builder = builder.with_accounts(&["ACCOUNT_1", "ACCOUNT_2"]);
        }

        let backends = Arc::new(builder.backends);
        let pool = Arc::new(ProviderPool::with_threshold(
            &builder.accounts,
            builder.config.pool.error_threshold,
            backends.as_ref(),
        ));

        let interviews = Arc::new(MockInterviewStore::new());
        let feedback = Arc::new(MockFeedbackStore::new());
        let reconciler = Arc::new(Reconciler::from_config(
            &builder.config,
            Arc::clone(&interviews) as Arc<dyn InterviewStore>,
            Arc::clone(&feedback) as Arc<dyn FeedbackStore>,
        )?);
        let controller = Arc::new(CallController::new(Arc::clone(&pool), reconciler));

        Ok(TestHarness {
            backends,
            interviews,
            feedback,
            pool,
            controller,
            registry: Arc::new(CallRegistry::new()),
            config: builder.config,
        })
    }
}

/// A fully assembled call stack over mock collaborators.
pub struct TestHarness {
    pub backends: Arc<MockBackendSet>,
    pub interviews: Arc<MockInterviewStore>,
    pub feedback: Arc<MockFeedbackStore>,
    pub pool: Arc<ProviderPool>,
    pub controller: Arc<CallController>,
    pub registry: Arc<CallRegistry>,
    pub config: IntervoxConfig,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub fn backend(&self, account: &str) -> Option<Arc<MockBackend>> {
        self.backends.get(account)
    }

    /// Start a call and follow it to its outcome.
    pub async fn run_call(&self, request: CallRequest) -> Result<CallOutcome, IntervoxError> {
        let call = self.controller.start_call(request).await?;
        Ok(call.run(CancellationToken::new()).await)
    }

    /// Launch a call on the registry, as the gateway does.
    pub async fn launch(&self, request: CallRequest) -> Result<CallSnapshot, IntervoxError> {
        self.registry.launch(&self.controller, request).await
    }

    /// Wait until a launched call has an outcome.
    pub async fn wait_for_outcome(&self, id: &SessionId) -> Option<CallOutcome> {
        let mut rx = self.registry.watch(id)?;
        let snapshot = rx
            .wait_for(|snapshot| snapshot.outcome.is_some())
            .await
            .ok()?;
        snapshot.outcome.clone()
    }
}
