// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend call handle for voice call providers.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::IntervoxError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AssistantConfig, CallEvent, CallVariables};

/// One call accepted by a backend, with its own ordered event stream.
///
/// The stream carries only this call's events. It ends after the call's
/// terminal event, or when the backend drops the call.
#[derive(Debug)]
pub struct StartedCall {
    /// Provider-assigned call id.
    pub call_id: String,
    pub events: mpsc::Receiver<CallEvent>,
}

/// A live handle to one credentialed call-provider account.
///
/// One account may carry several concurrent calls; each is addressed by the
/// call id returned from [`start`](CallBackend::start).
#[async_trait]
pub trait CallBackend: PluginAdapter {
    /// Starts a call with the given assistant and template variables.
    ///
    /// Resolves once the provider has accepted the call; the call itself is
    /// confirmed later by a [`CallEvent::CallStarted`] event on the returned
    /// stream. Events the provider reports before this resolves are queued
    /// onto the stream, not lost.
    async fn start(
        &self,
        assistant: &AssistantConfig,
        variables: &CallVariables,
    ) -> Result<StartedCall, IntervoxError>;

    /// Stops one call. Never fails; unknown ids are ignored.
    fn stop(&self, call_id: &str);
}
