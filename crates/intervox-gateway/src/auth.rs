// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request authentication.
//!
//! Operator routes under `/v1/*` take `Authorization: Bearer <token>`.
//! Provider webhooks take the provider's shared secret in
//! [`WEBHOOK_SECRET_HEADER`] instead.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

/// Header the call provider puts its server URL secret in.
pub const WEBHOOK_SECRET_HEADER: &str = "x-vapi-secret";

/// Authentication configuration for the gateway.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// Expected bearer token. `None` leaves the operator routes open.
    pub bearer_token: Option<String>,
    /// Expected webhook secret. `None` leaves webhooks open.
    pub webhook_secret: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Middleware that checks `Authorization: Bearer <token>`.
pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected_token) = auth.bearer_token.as_deref() else {
        return Ok(next.run(request).await);
    };

    let presented = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if token == expected_token => Ok(next.run(request).await),
        Some(_) => {
            tracing::debug!("gateway rejected request with wrong bearer token");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => Err(StatusCode::UNAUTHORIZED),
    }
}

/// Middleware that checks the provider's webhook secret header.
pub async fn webhook_auth_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected_secret) = auth.webhook_secret.as_deref() else {
        return Ok(next.run(request).await);
    };

    let presented = request
        .headers()
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());

    match presented {
        Some(secret) if secret == expected_secret => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!("gateway rejected webhook with wrong secret");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::debug!("gateway rejected webhook without a secret");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
