// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use intervox_agent::{CallController, CallRegistry};
use intervox_api::WebBackends;
use intervox_config::model::GatewayConfig;
use intervox_core::IntervoxError;
use intervox_resilience::StatusMonitor;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{auth_middleware, webhook_auth_middleware, AuthConfig};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub monitor: StatusMonitor,
    pub controller: Arc<CallController>,
    pub registry: Arc<CallRegistry>,
    /// Provider backends addressable by account, for webhook ingestion.
    pub webhooks: Option<Arc<WebBackends>>,
    pub auth: AuthConfig,
}

/// Gateway server configuration (mirrors `GatewayConfig` from intervox-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl From<&GatewayConfig> for ServerConfig {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }
}

/// Builds the gateway router.
///
/// - GET /health (public)
/// - GET /v1/accounts, GET /v1/accounts/summary, POST /v1/accounts/{name}/reset
/// - POST /v1/calls, GET /v1/calls, GET|DELETE /v1/calls/{id}
/// - POST /v1/webhooks/{account} (webhook secret, not the bearer token)
pub fn router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::get_public_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/v1/accounts", get(handlers::get_accounts))
        .route("/v1/accounts/summary", get(handlers::get_summary))
        .route("/v1/accounts/{name}/reset", post(handlers::reset_account))
        .route("/v1/calls", post(handlers::post_call).get(handlers::list_calls))
        .route(
            "/v1/calls/{id}",
            get(handlers::get_call).delete(handlers::delete_call),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state.clone(),
            auth_middleware,
        ))
        .with_state(state.clone());

    let webhook_routes = Router::new()
        .route("/v1/webhooks/{account}", post(handlers::post_webhook))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            webhook_auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .merge(webhook_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serves the gateway until `shutdown` is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), IntervoxError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| IntervoxError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| IntervoxError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}
