// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! Installs handlers for SIGTERM and SIGINT (Ctrl+C), triggering a
//! [`CancellationToken`] that the server and monitor watch. Live calls are
//! disconnected and given time to reconcile before the process exits.

use std::time::Duration;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::registry::CallRegistry;

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => {
                            info!("received SIGINT (Ctrl+C), initiating shutdown");
                        }
                        _ = sigterm.recv() => {
                            info!("received SIGTERM, initiating shutdown");
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler, listening for Ctrl+C only");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Disconnects every live call and waits up to `timeout` for their outcomes.
///
/// Submissions already in flight are not cancelled; calls still reconciling
/// at the deadline are reported and left to finish on their own.
pub async fn drain_calls(registry: &CallRegistry, timeout: Duration) {
    let live = registry.live();
    if live.is_empty() {
        info!("no live calls to drain");
        return;
    }

    info!(count = live.len(), "disconnecting live calls");
    let mut watchers = Vec::with_capacity(live.len());
    for id in &live {
        registry.disconnect(id);
        if let Some(rx) = registry.watch(id) {
            watchers.push(rx);
        }
    }

    let waits = watchers.into_iter().map(|mut rx| async move {
        let _ = rx.wait_for(|snapshot| snapshot.outcome.is_some()).await;
    });

    if tokio::time::timeout(timeout, join_all(waits)).await.is_ok() {
        info!("all calls drained");
    } else {
        warn!(
            remaining = registry.live().len(),
            "drain timeout reached, some calls still reconciling"
        );
    }
}
