// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `intervox serve` command implementation.
//!
//! Composition root: resolves provider accounts, builds the pool over live
//! provider backends, wires the reconciler to the interview and feedback
//! API, and serves the gateway until SIGINT or SIGTERM. Live calls are
//! disconnected and drained before exit.

use std::sync::Arc;
use std::time::Duration;

use intervox_agent::{shutdown, CallController, CallRegistry, Reconciler};
use intervox_api::{HttpFeedbackStore, HttpInterviewStore, WebBackends};
use intervox_config::model::IntervoxConfig;
use intervox_core::IntervoxError;
use intervox_gateway::{start_server, AuthConfig, GatewayState, ServerConfig};
use intervox_resilience::{ProviderPool, StatusMonitor};
use tracing::{error, info, warn};

/// How long shutdown waits for disconnected calls to reconcile.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// How often finished calls are checked against the retention window.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Runs the orchestrator until a shutdown signal arrives.
pub async fn run_serve(config: IntervoxConfig) -> Result<(), IntervoxError> {
    crate::init_tracing(&config.agent.log_level);
    info!(agent = %config.agent.name, "starting intervox serve");

    let accounts = intervox_config::resolve_accounts_from_env(&config);
    if accounts.is_empty() {
        warn!("no provider accounts configured, every call start will fail");
    }

    let backends = Arc::new(WebBackends::from_config(&config));
    let pool = Arc::new(ProviderPool::with_threshold(
        &accounts,
        config.pool.error_threshold,
        backends.as_ref(),
    ));
    let monitor = StatusMonitor::new(Arc::clone(&pool));

    let interviews = Arc::new(HttpInterviewStore::from_config(&config.api)?);
    let feedback = Arc::new(HttpFeedbackStore::from_config(&config.api)?);
    let reconciler = Arc::new(Reconciler::from_config(&config, interviews, feedback)?);
    let controller = Arc::new(CallController::new(Arc::clone(&pool), reconciler));
    let registry = Arc::new(CallRegistry::new());

    let cancel = shutdown::install_signal_handler();

    {
        let monitor = monitor.clone();
        let interval = Duration::from_secs(config.pool.monitor_interval_secs);
        let monitor_cancel = cancel.clone();
        tokio::spawn(async move {
            monitor.run_monitor(interval, monitor_cancel).await;
        });
    }

    {
        let registry = Arc::clone(&registry);
        let retention = Duration::from_secs(config.session.call_retention_secs);
        let pruner_cancel = cancel.clone();
        tokio::spawn(async move {
            registry
                .run_pruner(PRUNE_INTERVAL, retention, pruner_cancel)
                .await;
        });
    }

    if config.gateway.enabled {
        let state = GatewayState {
            monitor,
            controller,
            registry: Arc::clone(&registry),
            webhooks: Some(backends),
            auth: AuthConfig {
                bearer_token: config.gateway.bearer_token.clone(),
                webhook_secret: config.gateway.webhook_secret.clone(),
            },
        };
        let server_config = ServerConfig::from(&config.gateway);
        if let Err(e) = start_server(&server_config, state, cancel.clone()).await {
            error!(error = %e, "gateway failed");
            cancel.cancel();
            return Err(e);
        }
    } else {
        warn!("gateway disabled, waiting for shutdown signal");
        cancel.cancelled().await;
    }

    shutdown::drain_calls(&registry, DRAIN_TIMEOUT).await;
    info!("intervox serve shutdown complete");
    Ok(())
}
