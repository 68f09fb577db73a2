// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP collaborators for the Intervox call orchestrator.
//!
//! - [`HttpInterviewStore`] and [`HttpFeedbackStore`] talk to the application
//!   API that persists interviews and feedback.
//! - [`WebCallBackend`] starts calls on the provider and turns its webhook
//!   messages into call events; [`WebBackends`] builds one per pooled account.

mod client;
pub mod feedback;
pub mod interviews;
pub mod provider;

pub use feedback::HttpFeedbackStore;
pub use interviews::HttpInterviewStore;
pub use provider::{ProviderCall, ProviderMessage, ProviderWebhook, WebBackends, WebCallBackend};
