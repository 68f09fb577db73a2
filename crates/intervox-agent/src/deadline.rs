// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-call fallback timer.
//!
//! Armed when a call becomes ACTIVE. Expiry only flags the call; the default
//! payload itself is submitted during reconciliation, at most once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use intervox_core::SessionId;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Timer resolution. The timer fires one tick past the ceiling, matching the
/// strict comparison in [`FallbackDeadline::expire_if_elapsed`].
const TICK: Duration = Duration::from_millis(1);

/// Cancellable deadline for the generation-call fallback.
#[derive(Debug)]
pub struct FallbackDeadline {
    ceiling: Duration,
    expired: CancellationToken,
    cancel: CancellationToken,
    claimed: AtomicBool,
}

impl FallbackDeadline {
    /// Spawns the timer task and returns the shared deadline.
    pub fn arm(ceiling: Duration, session_id: &SessionId) -> Arc<Self> {
        let deadline = Arc::new(Self::unarmed(ceiling));
        let expired = deadline.expired.clone();
        let cancel = deadline.cancel.clone();
        let session_id = session_id.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(session_id = %session_id, "fallback deadline cancelled");
                }
                _ = tokio::time::sleep(ceiling + TICK) => {
                    info!(
                        session_id = %session_id,
                        ceiling_secs = ceiling.as_secs(),
                        "fallback ceiling reached"
                    );
                    expired.cancel();
                }
            }
        });

        deadline
    }

    /// A deadline with no timer task; it expires only via [`expire_if_elapsed`](Self::expire_if_elapsed).
    pub fn unarmed(ceiling: Duration) -> Self {
        Self {
            ceiling,
            expired: CancellationToken::new(),
            cancel: CancellationToken::new(),
            claimed: AtomicBool::new(false),
        }
    }

    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }

    /// Marks the deadline expired when `elapsed` is past the ceiling.
    pub fn expire_if_elapsed(&self, elapsed: Option<Duration>) {
        if elapsed.is_some_and(|e| e > self.ceiling) && !self.cancel.is_cancelled() {
            self.expired.cancel();
        }
    }

    pub fn has_expired(&self) -> bool {
        self.expired.is_cancelled() && !self.cancel.is_cancelled()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stops the timer; an expired-but-unclaimed deadline can no longer be claimed.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns `true` exactly once, and only for an expired, uncancelled deadline.
    pub fn claim(&self) -> bool {
        self.has_expired() && !self.claimed.swap(true, Ordering::SeqCst)
    }
}
