// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide table of launched calls, keyed by session id.
//!
//! Finished calls stay queryable for a retention window, then
//! [`CallRegistry::run_pruner`] drops them.

use std::time::Duration;

use dashmap::DashMap;
use intervox_core::types::{CallStatus, SessionId};
use intervox_core::IntervoxError;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::controller::{CallController, CallRequest, CallSnapshot};

struct CallEntry {
    snapshot: watch::Receiver<CallSnapshot>,
    disconnect: CancellationToken,
    /// First time a prune pass saw the outcome.
    finished_seen: Option<Instant>,
}

/// Launched calls with their latest snapshot and disconnect handle.
#[derive(Default)]
pub struct CallRegistry {
    calls: DashMap<SessionId, CallEntry>,
}

impl CallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a call and runs it on its own task.
    pub async fn launch(
        &self,
        controller: &CallController,
        request: CallRequest,
    ) -> Result<CallSnapshot, IntervoxError> {
        let call = controller.start_call(request).await?;
        let session_id = call.session_id().clone();
        let snapshot = call.subscribe();
        let disconnect = CancellationToken::new();

        self.calls.insert(
            session_id.clone(),
            CallEntry {
                snapshot: snapshot.clone(),
                disconnect: disconnect.clone(),
                finished_seen: None,
            },
        );

        tokio::spawn(call.run(disconnect));
        info!(session_id = %session_id, "call launched");
        let current = snapshot.borrow().clone();
        Ok(current)
    }

    pub fn snapshot(&self, id: &SessionId) -> Option<CallSnapshot> {
        self.calls.get(id).map(|entry| entry.snapshot.borrow().clone())
    }

    /// Watches one call. `None` for an unknown id.
    pub fn watch(&self, id: &SessionId) -> Option<watch::Receiver<CallSnapshot>> {
        self.calls.get(id).map(|entry| entry.snapshot.clone())
    }

    /// Requests a user disconnect. Returns `false` for an unknown id.
    pub fn disconnect(&self, id: &SessionId) -> bool {
        match self.calls.get(id) {
            Some(entry) => {
                entry.disconnect.cancel();
                true
            }
            None => false,
        }
    }

    pub fn list(&self) -> Vec<CallSnapshot> {
        self.calls
            .iter()
            .map(|entry| entry.snapshot.borrow().clone())
            .collect()
    }

    /// Calls that have not produced an outcome yet.
    pub fn live(&self) -> Vec<SessionId> {
        self.calls
            .iter()
            .filter(|entry| entry.snapshot.borrow().outcome.is_none())
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Calls currently CONNECTING or ACTIVE.
    pub fn active_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|entry| {
                matches!(
                    entry.snapshot.borrow().status,
                    CallStatus::Connecting | CallStatus::Active
                )
            })
            .count()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Drops calls whose outcome has been known for at least `retention`,
    /// measured from the first pass that saw it. Returns how many were removed.
    pub fn prune_finished(&self, retention: Duration) -> usize {
        let now = Instant::now();
        let before = self.calls.len();
        self.calls.retain(|_, entry| {
            if entry.snapshot.borrow().outcome.is_none() {
                return true;
            }
            let seen = *entry.finished_seen.get_or_insert(now);
            now.duration_since(seen) < retention
        });
        before.saturating_sub(self.calls.len())
    }

    /// Prunes finished calls every `interval` until `cancel` fires.
    pub async fn run_pruner(
        &self,
        interval: Duration,
        retention: Duration,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(interval);
        debug!(
            interval_secs = interval.as_secs(),
            retention_secs = retention.as_secs(),
            "call registry pruner started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("call registry pruner stopped");
                    return;
                }
                _ = ticker.tick() => {
                    let removed = self.prune_finished(retention);
                    if removed > 0 {
                        debug!(removed, remaining = self.calls.len(), "pruned finished calls");
                    }
                }
            }
        }
    }
}
