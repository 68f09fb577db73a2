// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `intervox replay` and `intervox generate-default` command implementations.
//!
//! A replay file is a saved call:
//!
//! ```json
//! {
//!   "session_type": "generate",
//!   "user_id": "user-1",
//!   "active_secs": 95,
//!   "transcript": [{"role": "assistant", "content": "..."}]
//! }
//! ```
//!
//! Without `--submit` only the extraction cascade runs and the first match
//! is printed. With `--submit` the call is reconciled against the interview
//! and feedback API exactly as a live call would be.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use intervox_agent::{CallContext, CallSession, ExtractionCascade, Reconciler};
use intervox_api::{HttpFeedbackStore, HttpInterviewStore};
use intervox_config::model::IntervoxConfig;
use intervox_core::types::{SessionType, TranscriptMessage};
use intervox_core::IntervoxError;
use serde::{Deserialize, Serialize};

/// A saved call transcript.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayFile {
    pub session_type: SessionType,
    pub user_id: String,
    #[serde(default)]
    pub interview_id: Option<String>,
    #[serde(default)]
    pub feedback_id: Option<String>,
    /// How long the call was ACTIVE. Drives the fallback ceiling.
    #[serde(default)]
    pub active_secs: Option<u64>,
    pub transcript: Vec<TranscriptMessage>,
}

impl ReplayFile {
    pub fn parse(content: &str) -> Result<Self, IntervoxError> {
        serde_json::from_str(content)
            .map_err(|e| IntervoxError::Config(format!("invalid replay file: {e}")))
    }

    pub fn session(&self) -> CallSession {
        CallSession::replayed(
            self.session_type,
            self.transcript.clone(),
            self.active_secs.map(Duration::from_secs),
        )
    }

    pub fn context(&self) -> CallContext {
        CallContext {
            user_id: self.user_id.clone(),
            interview_id: self.interview_id.clone(),
            feedback_id: self.feedback_id.clone(),
        }
    }
}

/// What a dry run found.
#[derive(Debug, Serialize)]
pub struct DryRun {
    pub strategies: Vec<&'static str>,
    pub marker_seen: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interview: Option<intervox_core::types::InterviewSpec>,
}

/// Runs the cascade over a transcript without submitting anything.
pub fn dry_run(config: &IntervoxConfig, replay: &ReplayFile) -> Result<DryRun, IntervoxError> {
    let cascade =
        ExtractionCascade::from_kinds(&config.session.extractors, &config.session.marker)?;
    let session = replay.session();
    let found = cascade.first_match(session.transcript());
    Ok(DryRun {
        strategies: cascade.names(),
        marker_seen: session.mentions(&config.session.marker),
        matched: found.as_ref().map(|(name, _)| *name),
        interview: found.map(|(_, spec)| spec),
    })
}

fn reconciler(config: &IntervoxConfig) -> Result<Reconciler, IntervoxError> {
    let interviews = Arc::new(HttpInterviewStore::from_config(&config.api)?);
    let feedback = Arc::new(HttpFeedbackStore::from_config(&config.api)?);
    Reconciler::from_config(config, interviews, feedback)
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    );
}

/// Run the `intervox replay` command.
pub async fn run_replay(
    config: &IntervoxConfig,
    file: &Path,
    submit: bool,
) -> Result<(), IntervoxError> {
    let content = std::fs::read_to_string(file).map_err(|e| {
        IntervoxError::Config(format!("failed to read {}: {e}", file.display()))
    })?;
    let replay = ReplayFile::parse(&content)?;

    if !submit {
        print_json(&dry_run(config, &replay)?);
        return Ok(());
    }

    let outcome = reconciler(config)?
        .reconcile(&replay.session(), &replay.context())
        .await?;
    print_json(&outcome);
    Ok(())
}

/// Run the `intervox generate-default` command.
pub async fn run_generate_default(
    config: &IntervoxConfig,
    user_id: &str,
) -> Result<(), IntervoxError> {
    if user_id.trim().is_empty() {
        return Err(IntervoxError::InvalidRequest("user id is required".into()));
    }
    let outcome = reconciler(config)?.submit_default(user_id).await?;
    print_json(&outcome);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use intervox_core::Speaker;

    fn replay(transcript: serde_json::Value) -> ReplayFile {
        ReplayFile::parse(
            &serde_json::json!({
                "session_type": "generate",
                "user_id": "user-1",
                "active_secs": 95,
                "transcript": transcript,
            })
            .to_string(),
        )
        .unwrap()
    }

    #[test]
    fn parses_saved_transcript() {
        let file = replay(serde_json::json!([
            {"role": "assistant", "content": "Which role?"},
            {"role": "user", "content": "Backend."},
        ]));
        assert_eq!(file.session_type, SessionType::Generate);
        assert_eq!(file.transcript[1].role, Speaker::User);
        let session = file.session();
        assert_eq!(session.active_duration(), Some(Duration::from_secs(95)));
        assert_eq!(file.context().user_id, "user-1");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = ReplayFile::parse(r#"{"session_type":"generate","user_id":"u","transcript":[],"extra":1}"#)
            .unwrap_err();
        assert!(err.to_string().contains("invalid replay file"));
    }

    #[test]
    fn dry_run_reports_first_match() {
        let config = IntervoxConfig::default();
        let file = replay(serde_json::json!([
            {"role": "assistant", "content": r#"INTERVIEW_DATA: {"type":"technical","role":"Frontend Developer","level":"junior","techstack":["React","TypeScript"],"amount":3}"#},
        ]));
        let result = dry_run(&config, &file).unwrap();
        assert!(result.marker_seen);
        assert_eq!(result.matched, Some("tagged_payload"));
        let spec = result.interview.unwrap();
        assert_eq!(spec.role(), "Frontend Developer");
        assert_eq!(spec.techstack(), "React, TypeScript");
    }

    #[tokio::test]
    async fn replay_reads_file_and_dry_runs() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"session_type":"generate","user_id":"u","transcript":[{{"role":"user","content":"hi"}}]}}"#
        )
        .unwrap();

        let config = IntervoxConfig::default();
        run_replay(&config, file.path(), false).await.unwrap();

        let missing = run_replay(&config, Path::new("/nonexistent/call.json"), false).await;
        assert!(matches!(missing, Err(IntervoxError::Config(_))));
    }

    #[tokio::test]
    async fn generate_default_rejects_blank_user() {
        let config = IntervoxConfig::default();
        let err = run_generate_default(&config, "  ").await.unwrap_err();
        assert!(matches!(err, IntervoxError::InvalidRequest(_)));
    }

    #[test]
    fn dry_run_without_match() {
        let config = IntervoxConfig::default();
        let file = replay(serde_json::json!([{"role": "user", "content": "hello"}]));
        let result = dry_run(&config, &file).unwrap();
        assert!(!result.marker_seen);
        assert!(result.matched.is_none());
        assert!(!result.strategies.is_empty());
    }
}
