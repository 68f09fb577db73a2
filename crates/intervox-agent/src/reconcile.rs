// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-of-call reconciliation: turn a finished transcript into an interview
//! or feedback, and decide where the caller goes next.
//!
//! Generation calls run the extraction cascade and submit each candidate in
//! turn; the first accepted submission wins. When nothing is accepted, a call
//! that never produced the payload marker and ran past the fallback ceiling
//! gets the default interview instead.

use std::sync::Arc;
use std::time::Duration;

use intervox_config::model::{FallbackConfig, IntervoxConfig, SessionConfig};
use intervox_core::types::{CallOutcome, CreatedInterview, FeedbackRequest, Redirect, SessionType};
use intervox_core::{CallStatus, FeedbackStore, InterviewSpec, InterviewStore, IntervoxError};
use tracing::{debug, info, warn};

use crate::deadline::FallbackDeadline;
use crate::extract::ExtractionCascade;
use crate::session::CallSession;

/// Strategy label recorded when the timeout default is accepted.
pub const TIMEOUT_FALLBACK: &str = "timeout_fallback";
/// Strategy label recorded for an on-demand default submission.
pub const MANUAL_DEFAULT: &str = "manual_default";

/// Who the call was for and what it refers to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    pub user_id: String,
    pub interview_id: Option<String>,
    pub feedback_id: Option<String>,
}

/// Reconciles finished sessions against the persistence collaborators.
pub struct Reconciler {
    interviews: Arc<dyn InterviewStore>,
    feedback: Arc<dyn FeedbackStore>,
    cascade: ExtractionCascade,
    default_spec: InterviewSpec,
    marker: String,
    ceiling: Duration,
}

impl Reconciler {
    pub fn new(
        interviews: Arc<dyn InterviewStore>,
        feedback: Arc<dyn FeedbackStore>,
        cascade: ExtractionCascade,
        session: &SessionConfig,
        fallback: &FallbackConfig,
    ) -> Result<Self, IntervoxError> {
        let default_spec = InterviewSpec::new(
            fallback.interview_type.as_str(),
            fallback.role.as_str(),
            fallback.level.as_str(),
            fallback.techstack.as_str(),
            fallback.amount,
        )
        .ok_or_else(|| IntervoxError::Config("fallback interview payload is incomplete".into()))?;

        Ok(Self {
            interviews,
            feedback,
            cascade,
            default_spec,
            marker: session.marker.clone(),
            ceiling: Duration::from_secs(session.fallback_timeout_secs),
        })
    }

    /// Builds the cascade from `[session]` and the default from `[fallback]`.
    pub fn from_config(
        config: &IntervoxConfig,
        interviews: Arc<dyn InterviewStore>,
        feedback: Arc<dyn FeedbackStore>,
    ) -> Result<Self, IntervoxError> {
        let cascade = ExtractionCascade::from_kinds(&config.session.extractors, &config.session.marker)?;
        Self::new(interviews, feedback, cascade, &config.session, &config.fallback)
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn fallback_ceiling(&self) -> Duration {
        self.ceiling
    }

    pub fn default_spec(&self) -> &InterviewSpec {
        &self.default_spec
    }

    pub fn cascade(&self) -> &ExtractionCascade {
        &self.cascade
    }

    /// Reconciles a finished session, judging the fallback ceiling from the
    /// session's recorded ACTIVE duration.
    pub async fn reconcile(
        &self,
        session: &CallSession,
        context: &CallContext,
    ) -> Result<CallOutcome, IntervoxError> {
        let deadline = FallbackDeadline::unarmed(self.ceiling);
        self.reconcile_with_deadline(session, context, &deadline).await
    }

    /// Reconciles against a live call's deadline.
    pub async fn reconcile_with_deadline(
        &self,
        session: &CallSession,
        context: &CallContext,
        deadline: &FallbackDeadline,
    ) -> Result<CallOutcome, IntervoxError> {
        if session.status() != CallStatus::Finished {
            return Err(IntervoxError::InvalidTransition {
                from: session.status().to_string(),
                to: "RECONCILED".to_string(),
            });
        }

        let outcome = match session.session_type() {
            SessionType::Interview => self.reconcile_interview(session, context).await,
            SessionType::Generate => {
                deadline.expire_if_elapsed(session.active_duration());
                self.reconcile_generation(session, context, deadline).await
            }
        };

        if let Some(redirect) = outcome.redirect() {
            info!(session_id = %session.id(), redirect = %redirect.path(), "call reconciled");
        }
        Ok(outcome)
    }

    /// Submits the default interview on demand.
    pub async fn submit_default(&self, user_id: &str) -> Result<CallOutcome, IntervoxError> {
        let created = self.submit(&self.default_spec, user_id).await?;
        info!(interview_id = %created.interview_id, "default interview created on demand");
        Ok(CallOutcome::Completed {
            redirect: Redirect::RefreshHome,
            interview_id: Some(created.interview_id),
            feedback_id: None,
            strategy: Some(MANUAL_DEFAULT.to_string()),
        })
    }

    async fn reconcile_interview(&self, session: &CallSession, context: &CallContext) -> CallOutcome {
        let Some(interview_id) = context.interview_id.clone() else {
            warn!(session_id = %session.id(), "interview call has no interview id, skipping feedback");
            return completed(Redirect::Home);
        };

        let request = FeedbackRequest {
            interview_id: interview_id.clone(),
            user_id: context.user_id.clone(),
            transcript: session.transcript().to_vec(),
            feedback_id: context.feedback_id.clone(),
        };

        match self.feedback.create_feedback(&request).await {
            Ok(outcome) if outcome.success && outcome.feedback_id.is_some() => CallOutcome::Completed {
                redirect: Redirect::FeedbackView { interview_id },
                interview_id: None,
                feedback_id: outcome.feedback_id,
                strategy: None,
            },
            Ok(_) => {
                warn!(session_id = %session.id(), "feedback collaborator returned no feedback");
                completed(Redirect::Home)
            }
            Err(e) => {
                warn!(session_id = %session.id(), error = %e, "error saving feedback");
                completed(Redirect::Home)
            }
        }
    }

    async fn reconcile_generation(
        &self,
        session: &CallSession,
        context: &CallContext,
        deadline: &FallbackDeadline,
    ) -> CallOutcome {
        for (strategy, spec) in self.cascade.candidates(session.transcript()) {
            match self.submit(&spec, &context.user_id).await {
                Ok(created) => {
                    deadline.cancel();
                    info!(
                        session_id = %session.id(),
                        strategy,
                        interview_id = %created.interview_id,
                        "interview created from transcript"
                    );
                    return CallOutcome::Completed {
                        redirect: Redirect::RefreshHome,
                        interview_id: Some(created.interview_id),
                        feedback_id: None,
                        strategy: Some(strategy.to_string()),
                    };
                }
                Err(e) => {
                    warn!(session_id = %session.id(), strategy, error = %e, "interview submission failed");
                }
            }
        }

        if session.mentions(&self.marker) {
            debug!(session_id = %session.id(), "marker was seen, no timeout fallback");
            return completed(Redirect::Home);
        }

        if !deadline.claim() {
            debug!(session_id = %session.id(), "no interview data and fallback ceiling not exceeded");
            return completed(Redirect::Home);
        }

        info!(session_id = %session.id(), "fallback ceiling exceeded, creating default interview");
        let interview_id = match self.submit(&self.default_spec, &context.user_id).await {
            Ok(created) => Some(created.interview_id),
            Err(e) => {
                warn!(session_id = %session.id(), error = %e, "failed to create default interview");
                None
            }
        };

        CallOutcome::Completed {
            redirect: Redirect::RefreshHome,
            interview_id,
            feedback_id: None,
            strategy: Some(TIMEOUT_FALLBACK.to_string()),
        }
    }

    async fn submit(&self, spec: &InterviewSpec, user_id: &str) -> Result<CreatedInterview, IntervoxError> {
        self.interviews.create_interview(&spec.to_request(user_id)).await
    }
}

fn completed(redirect: Redirect) -> CallOutcome {
    CallOutcome::Completed {
        redirect,
        interview_id: None,
        feedback_id: None,
        strategy: None,
    }
}
