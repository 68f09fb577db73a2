// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call life cycle: start a call on a pooled account, follow its events, and
//! reconcile once it finishes.

use std::sync::Arc;

use intervox_core::types::{CallEvent, CallOutcome, CallStatus, SessionId, SessionType};
use intervox_core::{CallBackend, IntervoxError, StartedCall};
use intervox_resilience::ProviderPool;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::assistant;
use crate::deadline::FallbackDeadline;
use crate::reconcile::{CallContext, Reconciler};
use crate::session::CallSession;

/// A request to start an agent call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRequest {
    pub user_name: String,
    pub user_id: String,
    pub session_type: SessionType,
    #[serde(default)]
    pub interview_id: Option<String>,
    #[serde(default)]
    pub feedback_id: Option<String>,
    #[serde(default)]
    pub questions: Vec<String>,
    /// Account to try first.
    #[serde(default)]
    pub preferred_account: Option<String>,
}

impl CallRequest {
    pub fn generate(user_name: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            user_id: user_id.into(),
            session_type: SessionType::Generate,
            interview_id: None,
            feedback_id: None,
            questions: Vec::new(),
            preferred_account: None,
        }
    }

    pub fn interview(
        user_name: impl Into<String>,
        user_id: impl Into<String>,
        interview_id: impl Into<String>,
        questions: Vec<String>,
    ) -> Self {
        Self {
            session_type: SessionType::Interview,
            interview_id: Some(interview_id.into()),
            questions,
            ..Self::generate(user_name, user_id)
        }
    }

    fn validate(&self) -> Result<(), IntervoxError> {
        if self.user_id.trim().is_empty() {
            return Err(IntervoxError::InvalidRequest("user id is required".into()));
        }
        if self.session_type == SessionType::Interview
            && self.interview_id.as_deref().is_none_or(|id| id.trim().is_empty())
        {
            return Err(IntervoxError::InvalidRequest(
                "interview calls require an interview id".into(),
            ));
        }
        Ok(())
    }

    fn context(&self) -> CallContext {
        CallContext {
            user_id: self.user_id.clone(),
            interview_id: self.interview_id.clone(),
            feedback_id: self.feedback_id.clone(),
        }
    }
}

/// Point-in-time view of a call, published on every state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallSnapshot {
    pub session_id: SessionId,
    pub session_type: SessionType,
    pub status: CallStatus,
    pub account: Option<String>,
    pub messages: usize,
    pub speaking: bool,
    pub outcome: Option<CallOutcome>,
}

impl CallSnapshot {
    fn of(session: &CallSession, outcome: Option<CallOutcome>) -> Self {
        Self {
            session_id: session.id().clone(),
            session_type: session.session_type(),
            status: session.status(),
            account: session.account().map(str::to_string),
            messages: session.transcript().len(),
            speaking: session.is_speaking(),
            outcome,
        }
    }
}

/// Starts calls on the provider pool.
pub struct CallController {
    pool: Arc<ProviderPool>,
    reconciler: Arc<Reconciler>,
}

impl CallController {
    pub fn new(pool: Arc<ProviderPool>, reconciler: Arc<Reconciler>) -> Self {
        Self { pool, reconciler }
    }

    pub fn pool(&self) -> &Arc<ProviderPool> {
        &self.pool
    }

    pub fn reconciler(&self) -> &Arc<Reconciler> {
        &self.reconciler
    }

    /// Starts a call, failing over across accounts until one accepts it.
    ///
    /// On exhaustion the session goes back to INACTIVE and the error is
    /// returned so the caller can offer a retry.
    pub async fn start_call(&self, request: CallRequest) -> Result<ActiveCall, IntervoxError> {
        request.validate()?;

        let mut session = CallSession::new(request.session_type);
        session.begin_connecting()?;

        let (assistant, variables) = match request.session_type {
            SessionType::Generate => (
                assistant::collector_assistant(&request.user_name, self.reconciler.marker()),
                assistant::collector_variables(&request.user_name, &request.user_id),
            ),
            SessionType::Interview => (
                assistant::interviewer_assistant(),
                assistant::interviewer_variables(
                    &request.user_name,
                    &request.user_id,
                    &request.questions,
                ),
            ),
        };

        let assistant = &assistant;
        let variables = &variables;
        let started = self
            .pool
            .execute_with_fallback(
                |account, backend: Arc<dyn CallBackend>| async move {
                    let call = backend.start(assistant, variables).await?;
                    Ok::<_, IntervoxError>((account, backend, call))
                },
                request.preferred_account.as_deref(),
            )
            .await;

        let (account, backend, StartedCall { call_id, events }) = match started {
            Ok(started) => started,
            Err(e) => {
                session.abort()?;
                error!(session_id = %session.id(), error = %e, "failed to start call");
                return Err(e);
            }
        };

        session.attach_account(account.as_str());
        info!(
            session_id = %session.id(),
            session_type = %request.session_type,
            account = %account,
            call_id = %call_id,
            "call connecting"
        );

        let (snapshot, _) = watch::channel(CallSnapshot::of(&session, None));
        Ok(ActiveCall {
            context: request.context(),
            session,
            backend,
            call_id,
            events,
            reconciler: Arc::clone(&self.reconciler),
            snapshot,
            deadline: None,
        })
    }
}

/// A started call bound to one backend handle.
pub struct ActiveCall {
    session: CallSession,
    context: CallContext,
    backend: Arc<dyn CallBackend>,
    call_id: String,
    events: mpsc::Receiver<CallEvent>,
    reconciler: Arc<Reconciler>,
    snapshot: watch::Sender<CallSnapshot>,
    deadline: Option<Arc<FallbackDeadline>>,
}

impl ActiveCall {
    pub fn session(&self) -> &CallSession {
        &self.session
    }

    pub fn session_id(&self) -> &SessionId {
        self.session.id()
    }

    /// Provider call id.
    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// Watches the call's snapshot; the final value carries the outcome.
    pub fn subscribe(&self) -> watch::Receiver<CallSnapshot> {
        self.snapshot.subscribe()
    }

    /// Follows backend events until the call finishes or aborts, then reconciles.
    ///
    /// Cancelling `disconnect` finishes the call immediately and stops the backend.
    pub async fn run(mut self, disconnect: CancellationToken) -> CallOutcome {
        let outcome = match self.follow_events(&disconnect).await {
            Ok(()) => self.reconcile().await,
            Err(reason) => {
                if let Some(deadline) = &self.deadline {
                    deadline.cancel();
                }
                warn!(session_id = %self.session.id(), reason = %reason, "call aborted");
                CallOutcome::Aborted { reason }
            }
        };

        self.publish(Some(outcome.clone()));
        outcome
    }

    /// Returns `Err(reason)` when the call aborted.
    async fn follow_events(&mut self, disconnect: &CancellationToken) -> Result<(), String> {
        loop {
            let next = tokio::select! {
                biased;
                _ = disconnect.cancelled() => None,
                event = self.events.recv() => Some(event),
            };
            let Some(event) = next else {
                info!(session_id = %self.session.id(), "user disconnected");
                self.finish()?;
                self.backend.stop(&self.call_id);
                return Ok(());
            };

            match event {
                Some(CallEvent::CallStarted) => {
                    self.session.mark_active().map_err(|e| e.to_string())?;
                    if self.session.session_type() == SessionType::Generate {
                        self.deadline = Some(FallbackDeadline::arm(
                            self.reconciler.fallback_ceiling(),
                            self.session.id(),
                        ));
                    }
                    info!(session_id = %self.session.id(), "call active");
                }
                Some(CallEvent::CallEnded) => {
                    self.finish()?;
                    return Ok(());
                }
                Some(CallEvent::Transcript {
                    role,
                    transcript_type,
                    text,
                }) => {
                    if self.session.record_transcript(role, transcript_type, &text) {
                        debug!(session_id = %self.session.id(), role = %role, "transcript message");
                    }
                }
                Some(CallEvent::SpeechStarted) => self.session.set_speaking(true),
                Some(CallEvent::SpeechStopped) => self.session.set_speaking(false),
                Some(CallEvent::Error { details }) => {
                    self.session.abort().map_err(|e| e.to_string())?;
                    self.publish(None);
                    return Err(details);
                }
                None => {
                    if self.session.status() == CallStatus::Active {
                        debug!(session_id = %self.session.id(), "event stream closed while active");
                        self.finish()?;
                        return Ok(());
                    }
                    self.session.abort().map_err(|e| e.to_string())?;
                    self.publish(None);
                    return Err("call event stream closed before the call started".to_string());
                }
            }
            self.publish(None);
        }
    }

    fn finish(&mut self) -> Result<(), String> {
        self.session.finish().map_err(|e| e.to_string())?;
        info!(
            session_id = %self.session.id(),
            messages = self.session.transcript().len(),
            active_secs = self.session.active_duration().map(|d| d.as_secs()),
            "call finished"
        );
        self.publish(None);
        Ok(())
    }

    async fn reconcile(&self) -> CallOutcome {
        let unarmed;
        let deadline = match &self.deadline {
            Some(deadline) => deadline.as_ref(),
            None => {
                unarmed = FallbackDeadline::unarmed(self.reconciler.fallback_ceiling());
                &unarmed
            }
        };

        let result = self
            .reconciler
            .reconcile_with_deadline(&self.session, &self.context, deadline)
            .await;
        deadline.cancel();

        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(session_id = %self.session.id(), error = %e, "reconciliation failed");
                CallOutcome::Aborted {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn publish(&self, outcome: Option<CallOutcome>) {
        self.snapshot.send_replace(CallSnapshot::of(&self.session, outcome));
    }
}
