// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock call backend for deterministic testing.
//!
//! `MockBackend` implements `CallBackend` with a scripted event sequence that
//! is emitted when a call starts, injectable start failures, and captured
//! start/stop calls for assertion in tests. Every started call gets its own
//! event stream, addressed by a generated call id.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{Mutex, mpsc};

use intervox_config::model::AccountConfig;
use intervox_core::traits::adapter::PluginAdapter;
use intervox_core::traits::backend::{CallBackend, StartedCall};
use intervox_core::types::{
    AdapterType, AssistantConfig, CallEvent, CallVariables, HealthStatus, Speaker, TranscriptType,
};
use intervox_core::IntervoxError;
use intervox_resilience::BackendFactory;

const EVENT_BUFFER: usize = 64;

/// A mock call backend bound to one account.
///
/// Start failures are popped from a FIFO queue; when the queue is empty the
/// start succeeds (unless [`fail_all_starts`](Self::fail_all_starts) is set)
/// and the script is emitted on the new call's stream. A call's stream stays
/// open until a terminal event or [`stop`](CallBackend::stop).
pub struct MockBackend {
    name: String,
    calls: DashMap<String, mpsc::Sender<CallEvent>>,
    next_call: AtomicUsize,
    script: Mutex<Vec<CallEvent>>,
    start_failures: Mutex<VecDeque<String>>,
    fail_always: AtomicBool,
    starts: Mutex<Vec<(AssistantConfig, CallVariables)>>,
    stops: AtomicUsize,
}

impl MockBackend {
    /// Create a mock backend with an empty script.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calls: DashMap::new(),
            next_call: AtomicUsize::new(0),
            script: Mutex::new(Vec::new()),
            start_failures: Mutex::new(VecDeque::new()),
            fail_always: AtomicBool::new(false),
            starts: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
        }
    }

    /// Create a mock backend that emits `script` on every successful start.
    pub fn with_script(name: impl Into<String>, script: Vec<CallEvent>) -> Self {
        let backend = Self::new(name);
        Self {
            script: Mutex::new(script),
            ..backend
        }
    }

    /// Replace the event script.
    pub async fn set_script(&self, script: Vec<CallEvent>) {
        *self.script.lock().await = script;
    }

    /// Make the next start fail with a provider error.
    pub async fn fail_next_start(&self, message: impl Into<String>) {
        self.start_failures.lock().await.push_back(message.into());
    }

    /// Make every start fail.
    pub fn fail_all_starts(&self) {
        self.fail_always.store(true, Ordering::SeqCst);
    }

    /// Emit an event on one call's stream. Returns whether the call was live.
    ///
    /// A terminal event closes the stream after it.
    pub fn emit(&self, call_id: &str, event: CallEvent) -> bool {
        let terminal = event.is_terminal();
        let delivered = self
            .calls
            .get(call_id)
            .is_some_and(|sender| sender.try_send(event).is_ok());
        if terminal {
            self.calls.remove(call_id);
        }
        delivered
    }

    /// Number of calls whose stream is still open.
    pub fn live_calls(&self) -> usize {
        self.calls.len()
    }

    /// Number of start attempts, failed ones included.
    pub async fn start_count(&self) -> usize {
        self.starts.lock().await.len()
    }

    /// Assistant and variables of the most recent start attempt.
    pub async fn last_start(&self) -> Option<(AssistantConfig, CallVariables)> {
        self.starts.lock().await.last().cloned()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginAdapter for MockBackend {
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
        if self.fail_always.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Unhealthy("mock backend refuses calls".into()));
        }
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl CallBackend for MockBackend {
    async fn start(
        &self,
        assistant: &AssistantConfig,
        variables: &CallVariables,
    ) -> Result<StartedCall, IntervoxError> {
        self.starts
            .lock()
            .await
            .push((assistant.clone(), variables.clone()));

        if let Some(message) = self.start_failures.lock().await.pop_front() {
            return Err(IntervoxError::provider(message));
        }
        if self.fail_always.load(Ordering::SeqCst) {
            return Err(IntervoxError::provider(format!("{} refused the call", self.name)));
        }

        let call_id = format!(
            "{}-call-{}",
            self.name,
            self.next_call.fetch_add(1, Ordering::SeqCst) + 1
        );
        let script = self.script.lock().await.clone();
        let (sender, events) = mpsc::channel(EVENT_BUFFER.max(script.len() + 1));
        let ended = script.iter().any(CallEvent::is_terminal);
        for event in script {
            let _ = sender.try_send(event);
        }
        if !ended {
            self.calls.insert(call_id.clone(), sender);
        }
        Ok(StartedCall { call_id, events })
    }

    fn stop(&self, call_id: &str) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if let Some((_, sender)) = self.calls.remove(call_id) {
            let _ = sender.try_send(CallEvent::CallEnded);
        }
    }
}

/// Backend factory that hands out one [`MockBackend`] per account and keeps
/// them reachable for assertions.
#[derive(Default)]
pub struct MockBackendSet {
    backends: DashMap<String, Arc<MockBackend>>,
    script: Vec<CallEvent>,
    failing: HashSet<String>,
    refused: HashSet<String>,
}

impl MockBackendSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every created backend emits `script` on start.
    pub fn with_script(mut self, script: Vec<CallEvent>) -> Self {
        self.script = script;
        self
    }

    /// The backend for `account` fails every start.
    pub fn failing(mut self, account: &str) -> Self {
        self.failing.insert(account.to_string());
        self
    }

    /// Construction of the backend for `account` fails.
    pub fn refusing(mut self, account: &str) -> Self {
        self.refused.insert(account.to_string());
        self
    }

    pub fn get(&self, account: &str) -> Option<Arc<MockBackend>> {
        self.backends.get(account).map(|b| Arc::clone(b.value()))
    }

    /// Number of backends built so far.
    pub fn created(&self) -> usize {
        self.backends.len()
    }
}

impl BackendFactory for MockBackendSet {
    fn create(&self, account: &AccountConfig) -> Result<Arc<dyn CallBackend>, IntervoxError> {
        if self.refused.contains(&account.name) {
            return Err(IntervoxError::provider(format!(
                "cannot build backend for {}",
                account.name
            )));
        }
        let backend = Arc::new(MockBackend::with_script(
            account.name.clone(),
            self.script.clone(),
        ));
        if self.failing.contains(&account.name) {
            backend.fail_all_starts();
        }
        self.backends
            .insert(account.name.clone(), Arc::clone(&backend));
        Ok(backend)
    }
}

/// Final transcript turn helper.
pub fn said(role: Speaker, text: &str) -> CallEvent {
    CallEvent::Transcript {
        role,
        transcript_type: TranscriptType::Final,
        text: text.to_string(),
    }
}

/// A complete call: started, the given turns, ended.
pub fn scripted_call(turns: &[(Speaker, &str)]) -> Vec<CallEvent> {
    let mut script = vec![CallEvent::CallStarted];
    script.extend(turns.iter().map(|(role, text)| said(*role, text)));
    script.push(CallEvent::CallEnded);
    script
}
