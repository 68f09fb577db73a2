// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Intervox call orchestrator.

use thiserror::Error;

/// The primary error type used across all Intervox collaborator traits and core operations.
#[derive(Debug, Error)]
pub enum IntervoxError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Call provider errors (rejected credentials, rate limiting, failed call start).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// No provider account is eligible for selection.
    #[error("all provider accounts are unavailable")]
    AccountsExhausted,

    /// The selected account has no live backend handle (construction failed at startup).
    #[error("no backend handle for account {account}")]
    BackendUnavailable { account: String },

    /// Interview or feedback submission to a persistence collaborator failed.
    #[error("submission failed: {message}")]
    Submission {
        message: String,
        /// HTTP status returned by the collaborator, when one was received.
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A call request is missing data its session type requires.
    #[error("invalid call request: {0}")]
    InvalidRequest(String),

    /// A call session was asked to move between states that are not connected.
    #[error("invalid call transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntervoxError {
    /// Shorthand for a provider error without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a submission error carrying the collaborator's status code.
    pub fn submission(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Submission {
            message: message.into(),
            status,
            source: None,
        }
    }

    /// Whether the collaborator rejected the request as malformed (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Submission { status: Some(code), .. } if (400..500).contains(code)
        )
    }
}
