// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-call FSM: INACTIVE -> CONNECTING -> ACTIVE -> FINISHED.
//!
//! A backend error during CONNECTING or ACTIVE drops the session back to
//! INACTIVE. Once FINISHED the transcript is frozen and the session is ready
//! for reconciliation.

use std::time::Duration;

use intervox_core::types::{CallStatus, SessionId, SessionType, Speaker, TranscriptMessage, TranscriptType};
use intervox_core::IntervoxError;
use tokio::time::Instant;
use tracing::debug;

/// State and transcript of a single agent call.
#[derive(Debug, Clone)]
pub struct CallSession {
    id: SessionId,
    session_type: SessionType,
    status: CallStatus,
    transcript: Vec<TranscriptMessage>,
    started_at: Option<Instant>,
    /// Time spent ACTIVE, fixed when the session finishes.
    active_duration: Option<Duration>,
    speaking: bool,
    account: Option<String>,
}

impl CallSession {
    pub fn new(session_type: SessionType) -> Self {
        Self::with_id(SessionId::generate(), session_type)
    }

    pub fn with_id(id: SessionId, session_type: SessionType) -> Self {
        Self {
            id,
            session_type,
            status: CallStatus::Inactive,
            transcript: Vec::new(),
            started_at: None,
            active_duration: None,
            speaking: false,
            account: None,
        }
    }

    /// A FINISHED session rebuilt from a saved transcript, for offline reconciliation.
    pub fn replayed(
        session_type: SessionType,
        transcript: Vec<TranscriptMessage>,
        active_duration: Option<Duration>,
    ) -> Self {
        Self {
            status: CallStatus::Finished,
            transcript,
            active_duration,
            ..Self::new(session_type)
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn session_type(&self) -> SessionType {
        self.session_type
    }

    pub fn status(&self) -> CallStatus {
        self.status
    }

    pub fn transcript(&self) -> &[TranscriptMessage] {
        &self.transcript
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    /// How long the call was ACTIVE. `None` if it never became ACTIVE or has not finished.
    pub fn active_duration(&self) -> Option<Duration> {
        self.active_duration
    }

    /// When the session entered ACTIVE.
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    pub fn attach_account(&mut self, name: impl Into<String>) {
        self.account = Some(name.into());
    }

    /// INACTIVE -> CONNECTING.
    pub fn begin_connecting(&mut self) -> Result<(), IntervoxError> {
        self.transition(CallStatus::Connecting)
    }

    /// CONNECTING -> ACTIVE, recording the start instant.
    pub fn mark_active(&mut self) -> Result<(), IntervoxError> {
        self.transition(CallStatus::Active)?;
        self.started_at = Some(Instant::now());
        Ok(())
    }

    /// CONNECTING or ACTIVE -> FINISHED. Freezes the transcript.
    pub fn finish(&mut self) -> Result<(), IntervoxError> {
        self.transition(CallStatus::Finished)?;
        self.active_duration = self.started_at.map(|start| start.elapsed());
        self.speaking = false;
        Ok(())
    }

    /// CONNECTING or ACTIVE -> INACTIVE after a backend error.
    pub fn abort(&mut self) -> Result<(), IntervoxError> {
        self.transition(CallStatus::Inactive)?;
        self.speaking = false;
        Ok(())
    }

    /// Records a transcript fragment. Partial fragments and anything arriving
    /// after FINISHED are dropped. Returns whether the fragment was appended.
    pub fn record_transcript(
        &mut self,
        role: Speaker,
        transcript_type: TranscriptType,
        text: &str,
    ) -> bool {
        if transcript_type != TranscriptType::Final || self.status == CallStatus::Finished {
            return false;
        }
        self.transcript.push(TranscriptMessage::new(role, text));
        true
    }

    pub fn set_speaking(&mut self, speaking: bool) {
        if self.status != CallStatus::Finished {
            self.speaking = speaking;
        }
    }

    /// Whether any retained message contains `marker`.
    pub fn mentions(&self, marker: &str) -> bool {
        self.transcript.iter().any(|m| m.content.contains(marker))
    }

    fn transition(&mut self, to: CallStatus) -> Result<(), IntervoxError> {
        use CallStatus::*;
        let allowed = matches!(
            (self.status, to),
            (Inactive, Connecting)
                | (Connecting, Active)
                | (Connecting, Finished)
                | (Active, Finished)
                | (Connecting, Inactive)
                | (Active, Inactive)
        );
        if !allowed {
            return Err(IntervoxError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        debug!(session_id = %self.id, from = %self.status, to = %to, "call status transition");
        self.status = to;
        Ok(())
    }
}
