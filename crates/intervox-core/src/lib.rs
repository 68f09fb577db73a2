// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Intervox call orchestrator.
//!
//! This crate provides the error type, the shared call/transcript/interview
//! types, and the collaborator traits (call backends, interview and feedback
//! stores) used throughout the workspace.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::IntervoxError;
pub use types::{
    AdapterType, CallEvent, CallOutcome, CallStatus, HealthStatus, InterviewSpec, Redirect,
    SessionId, SessionType, Speaker, TranscriptMessage, TranscriptType,
};

pub use traits::{CallBackend, FeedbackStore, InterviewStore, PluginAdapter, StartedCall};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CallVariables, FeedbackRequest};
    use proptest::prelude::*;

    #[test]
    fn intervox_error_has_all_variants() {
        let _config = IntervoxError::Config("test".into());
        let _provider = IntervoxError::provider("test");
        let _exhausted = IntervoxError::AccountsExhausted;
        let _unavailable = IntervoxError::BackendUnavailable {
            account: "ACCOUNT_1".into(),
        };
        let _submission = IntervoxError::submission("test", Some(500));
        let _transition = IntervoxError::InvalidTransition {
            from: "INACTIVE".into(),
            to: "FINISHED".into(),
        };
        let _timeout = IntervoxError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _request = IntervoxError::InvalidRequest("test".into());
        let _internal = IntervoxError::Internal("test".into());
    }

    #[test]
    fn client_errors_are_detected_by_status() {
        assert!(IntervoxError::submission("missing fields", Some(400)).is_client_error());
        assert!(!IntervoxError::submission("boom", Some(500)).is_client_error());
        assert!(!IntervoxError::submission("offline", None).is_client_error());
        assert!(!IntervoxError::AccountsExhausted.is_client_error());
    }

    #[test]
    fn call_status_display_and_parse() {
        use std::str::FromStr;

        assert_eq!(CallStatus::Inactive.to_string(), "INACTIVE");
        assert_eq!(CallStatus::Finished.to_string(), "FINISHED");
        assert_eq!(CallStatus::from_str("CONNECTING").unwrap(), CallStatus::Connecting);
        let json = serde_json::to_string(&CallStatus::Active).unwrap();
        assert_eq!(json, "\"ACTIVE\"");
    }

    #[test]
    fn session_type_parses_case_insensitively() {
        use std::str::FromStr;

        assert_eq!(SessionType::from_str("generate").unwrap(), SessionType::Generate);
        assert_eq!(SessionType::from_str("INTERVIEW").unwrap(), SessionType::Interview);
        assert!(SessionType::from_str("survey").is_err());
    }

    #[test]
    fn interview_spec_rejects_partial_input() {
        assert!(InterviewSpec::new("mixed", "Backend Developer", "senior", "Rust", 5).is_some());
        assert!(InterviewSpec::new("", "Backend Developer", "senior", "Rust", 5).is_none());
        assert!(InterviewSpec::new("mixed", "   ", "senior", "Rust", 5).is_none());
        assert!(InterviewSpec::new("mixed", "Backend Developer", "", "Rust", 5).is_none());
        assert!(InterviewSpec::new("mixed", "Backend Developer", "senior", "", 5).is_none());
        assert!(InterviewSpec::new("mixed", "Backend Developer", "senior", "Rust", 0).is_none());
    }

    #[test]
    fn interview_spec_trims_and_splits_stack() {
        let spec = InterviewSpec::new(" technical ", " Frontend Developer", "junior", "React, TypeScript ,", 10)
            .unwrap();
        assert_eq!(spec.interview_type(), "technical");
        assert_eq!(spec.role(), "Frontend Developer");
        assert_eq!(spec.techstack(), "React, TypeScript ,");
        assert_eq!(spec.tech_stack_items(), vec!["React", "TypeScript"]);
    }

    #[test]
    fn create_request_uses_wire_field_names() {
        let spec = InterviewSpec::new("mixed", "Backend Developer", "senior", "Node.js, MongoDB", 12)
            .unwrap();
        let json = serde_json::to_value(spec.to_request("user-1")).unwrap();
        assert_eq!(json["type"], "mixed");
        assert_eq!(json["techstack"], "Node.js, MongoDB");
        assert_eq!(json["amount"], 12);
        assert_eq!(json["userid"], "user-1");
    }

    #[test]
    fn feedback_request_omits_missing_feedback_id() {
        let req = FeedbackRequest {
            interview_id: "iv-1".into(),
            user_id: "user-1".into(),
            transcript: vec![TranscriptMessage::new(Speaker::User, "hello")],
            feedback_id: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["interviewId"], "iv-1");
        assert_eq!(json["transcript"][0]["role"], "user");
        assert!(json.get("feedbackId").is_none());
    }

    #[test]
    fn redirect_paths() {
        assert_eq!(
            Redirect::FeedbackView {
                interview_id: "abc".into()
            }
            .path(),
            "/interview/abc/feedback"
        );
        assert_eq!(Redirect::Home.path(), "/");
        assert_eq!(Redirect::RefreshHome.path(), "/?refresh=true");
    }

    #[test]
    fn call_variables_builder() {
        let vars = CallVariables::new().with("username", "Ada").with("userid", "u-1");
        assert_eq!(vars.get("username"), Some("Ada"));
        assert_eq!(vars.get("questions"), None);
        let json = serde_json::to_value(&vars).unwrap();
        assert_eq!(json["userid"], "u-1");
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_call_backend<T: CallBackend>() {}
        fn _assert_interview_store<T: InterviewStore>() {}
        fn _assert_feedback_store<T: FeedbackStore>() {}
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
    }

    proptest! {
        #[test]
        fn spec_with_any_blank_field_is_rejected(
            blank_index in 0usize..4,
            filler in "[a-z]{1,12}",
            amount in 1u32..50,
        ) {
            let mut fields = vec![filler.clone(); 4];
            fields[blank_index] = "  ".to_string();
            let spec = InterviewSpec::new(
                fields[0].clone(),
                fields[1].clone(),
                fields[2].clone(),
                fields[3].clone(),
                amount,
            );
            prop_assert!(spec.is_none());
        }
    }
}
