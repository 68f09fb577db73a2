// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use intervox_agent::{CallRequest, CallSnapshot};
use intervox_api::ProviderWebhook;
use intervox_core::types::SessionId;
use intervox_core::IntervoxError;
use intervox_resilience::{AccountStatus, PoolSummary, Recommendation};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::server::GatewayState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` or `unhealthy`.
    pub status: &'static str,
    pub recommendation: Recommendation,
    pub message: &'static str,
    pub version: &'static str,
}

/// Response body for GET /v1/accounts/summary.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    #[serde(flatten)]
    pub summary: PoolSummary,
    pub is_healthy: bool,
    pub recommendation: Recommendation,
    pub message: &'static str,
}

/// Response body for POST /v1/calls.
#[derive(Debug, Serialize)]
pub struct CallStarted {
    pub session_id: SessionId,
    pub account: Option<String>,
    pub status: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Webhook body: the provider wraps its message, but a bare message is accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WebhookBody {
    Wrapped { message: ProviderWebhook },
    Bare(ProviderWebhook),
}

impl WebhookBody {
    fn into_message(self) -> ProviderWebhook {
        match self {
            WebhookBody::Wrapped { message } | WebhookBody::Bare(message) => message,
        }
    }
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Maps a call start failure to its HTTP status.
fn start_error(e: &IntervoxError) -> StatusCode {
    match e {
        IntervoxError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        IntervoxError::AccountsExhausted
        | IntervoxError::BackendUnavailable { .. }
        | IntervoxError::Provider { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// GET /health (unauthenticated)
pub async fn get_public_health(State(state): State<GatewayState>) -> Response {
    let summary = state.monitor.summary().await;
    let recommendation = summary.recommendation();
    let (status, code) = if summary.is_healthy() {
        ("healthy", StatusCode::OK)
    } else {
        ("unhealthy", StatusCode::SERVICE_UNAVAILABLE)
    };
    (
        code,
        Json(HealthResponse {
            status,
            recommendation,
            message: recommendation.message(),
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
        .into_response()
}

/// GET /v1/accounts
pub async fn get_accounts(State(state): State<GatewayState>) -> Json<Vec<AccountStatus>> {
    Json(state.monitor.status().await)
}

/// GET /v1/accounts/summary
pub async fn get_summary(State(state): State<GatewayState>) -> Json<SummaryResponse> {
    let summary = state.monitor.summary().await;
    let recommendation = summary.recommendation();
    Json(SummaryResponse {
        summary,
        is_healthy: summary.is_healthy(),
        recommendation,
        message: recommendation.message(),
    })
}

/// POST /v1/accounts/{name}/reset
pub async fn reset_account(
    State(state): State<GatewayState>,
    Path(name): Path<String>,
) -> Response {
    if state.monitor.reset_account(&name).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        error(StatusCode::NOT_FOUND, format!("unknown account {name}"))
    }
}

/// POST /v1/calls
pub async fn post_call(
    State(state): State<GatewayState>,
    Json(request): Json<CallRequest>,
) -> Response {
    match state.registry.launch(&state.controller, request).await {
        Ok(snapshot) => (
            StatusCode::ACCEPTED,
            Json(CallStarted {
                session_id: snapshot.session_id,
                account: snapshot.account,
                status: snapshot.status.to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "call start rejected");
            error(start_error(&e), e.to_string())
        }
    }
}

/// GET /v1/calls
pub async fn list_calls(State(state): State<GatewayState>) -> Json<Vec<CallSnapshot>> {
    Json(state.registry.list())
}

/// GET /v1/calls/{id}
pub async fn get_call(State(state): State<GatewayState>, Path(id): Path<String>) -> Response {
    match state.registry.snapshot(&SessionId(id)) {
        Some(snapshot) => Json(snapshot).into_response(),
        None => error(StatusCode::NOT_FOUND, "unknown call"),
    }
}

/// DELETE /v1/calls/{id}
pub async fn delete_call(State(state): State<GatewayState>, Path(id): Path<String>) -> Response {
    let id = SessionId(id);
    if state.registry.disconnect(&id) {
        info!(session_id = %id, "disconnect requested");
        StatusCode::ACCEPTED.into_response()
    } else {
        error(StatusCode::NOT_FOUND, "unknown call")
    }
}

/// POST /v1/webhooks/{account}
pub async fn post_webhook(
    State(state): State<GatewayState>,
    Path(account): Path<String>,
    Json(body): Json<WebhookBody>,
) -> Response {
    let Some(webhooks) = &state.webhooks else {
        return error(StatusCode::NOT_FOUND, "webhook ingestion is not enabled");
    };
    match webhooks.ingest(&account, &body.into_message()).await {
        Some(true) => StatusCode::ACCEPTED.into_response(),
        Some(false) => StatusCode::NO_CONTENT.into_response(),
        None => error(StatusCode::NOT_FOUND, format!("unknown account {account}")),
    }
}
