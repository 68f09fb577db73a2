// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP surface for the Intervox call orchestrator.
//!
//! Exposes pool health and account resets for operators, call start and
//! disconnect for clients, and webhook ingestion for the call provider.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::{AuthConfig, WEBHOOK_SECRET_HEADER};
pub use server::{router, start_server, GatewayState, ServerConfig};
