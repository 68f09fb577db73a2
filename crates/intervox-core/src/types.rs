// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the pool manager, the call controller, and the
//! collaborator adapters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a call session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generates a fresh random session identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of collaborator behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    CallBackend,
    InterviewStore,
    FeedbackStore,
}

/// Life-cycle status of a call session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallStatus {
    Inactive,
    Connecting,
    Active,
    Finished,
}

/// What a call is for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    /// Open dialogue that collects parameters for a new interview.
    Generate,
    /// Scripted interview whose transcript becomes feedback.
    Interview,
}

/// Who spoke a transcript turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
    System,
}

/// Whether a transcript fragment is still being revised by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TranscriptType {
    Partial,
    Final,
}

/// One retained turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub role: Speaker,
    pub content: String,
}

impl TranscriptMessage {
    pub fn new(role: Speaker, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Events delivered by a backend call handle, totally ordered per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    CallStarted,
    CallEnded,
    Transcript {
        role: Speaker,
        transcript_type: TranscriptType,
        text: String,
    },
    SpeechStarted,
    SpeechStopped,
    Error { details: String },
}

impl CallEvent {
    /// Whether no further events follow this one for the same call.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallEvent::CallEnded | CallEvent::Error { .. })
    }
}

/// Assistant definition handed to a backend when a call starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantConfig {
    pub name: String,
    pub first_message: String,
    pub system_prompt: String,
    pub model_provider: String,
    pub model: String,
}

/// Template variables substituted by the provider into the assistant prompts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallVariables(pub BTreeMap<String, String>);

impl CallVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion.
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

/// A fully populated interview specification extracted from a transcript.
///
/// Only obtainable through [`InterviewSpec::new`], which rejects empty fields
/// and a zero question count, so a partially populated spec never exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterviewSpec {
    #[serde(rename = "type")]
    interview_type: String,
    role: String,
    level: String,
    techstack: String,
    amount: u32,
}

impl InterviewSpec {
    pub fn new(
        interview_type: impl Into<String>,
        role: impl Into<String>,
        level: impl Into<String>,
        techstack: impl Into<String>,
        amount: u32,
    ) -> Option<Self> {
        let spec = Self {
            interview_type: interview_type.into().trim().to_string(),
            role: role.into().trim().to_string(),
            level: level.into().trim().to_string(),
            techstack: techstack.into().trim().to_string(),
            amount,
        };
        let complete = !spec.interview_type.is_empty()
            && !spec.role.is_empty()
            && !spec.level.is_empty()
            && !spec.techstack.is_empty()
            && spec.amount > 0;
        complete.then_some(spec)
    }

    pub fn interview_type(&self) -> &str {
        &self.interview_type
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    /// The tech stack as spoken, e.g. `"Node.js, MongoDB"`.
    pub fn techstack(&self) -> &str {
        &self.techstack
    }

    /// The tech stack split into its comma-separated items.
    pub fn tech_stack_items(&self) -> Vec<String> {
        self.techstack
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    /// Builds the creation request body for the given user.
    pub fn to_request(&self, user_id: &str) -> CreateInterviewRequest {
        CreateInterviewRequest {
            interview_type: self.interview_type.clone(),
            role: self.role.clone(),
            level: self.level.clone(),
            techstack: self.techstack.clone(),
            amount: self.amount,
            userid: user_id.to_string(),
        }
    }
}

/// Body of the interview creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateInterviewRequest {
    #[serde(rename = "type")]
    pub interview_type: String,
    pub role: String,
    pub level: String,
    pub techstack: String,
    pub amount: u32,
    pub userid: String,
}

/// Interview accepted by the creation collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedInterview {
    pub interview_id: String,
}

/// Request to turn an interview transcript into feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub interview_id: String,
    pub user_id: String,
    pub transcript: Vec<TranscriptMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_id: Option<String>,
}

/// Response of the feedback collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackOutcome {
    pub success: bool,
    #[serde(default)]
    pub feedback_id: Option<String>,
}

/// Where the caller should go once a call has been reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Redirect {
    /// Show the feedback generated for the interview.
    FeedbackView { interview_id: String },
    /// Return home without refreshing the interview list.
    Home,
    /// Return home and reload the interview list.
    RefreshHome,
}

impl Redirect {
    /// The application route this redirect maps to.
    pub fn path(&self) -> String {
        match self {
            Redirect::FeedbackView { interview_id } => format!("/interview/{interview_id}/feedback"),
            Redirect::Home => "/".to_string(),
            Redirect::RefreshHome => "/?refresh=true".to_string(),
        }
    }
}

/// Final result of one call session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CallOutcome {
    /// The backend reported an error; the session went back to INACTIVE.
    Aborted { reason: String },
    /// The call finished and reconciliation ran.
    Completed {
        redirect: Redirect,
        /// Interview created on the generation path.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        interview_id: Option<String>,
        /// Feedback created on the interview path.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        feedback_id: Option<String>,
        /// Name of the strategy whose result was accepted.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        strategy: Option<String>,
    },
}

impl CallOutcome {
    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            CallOutcome::Completed { redirect, .. } => Some(redirect),
            CallOutcome::Aborted { .. } => None,
        }
    }
}
