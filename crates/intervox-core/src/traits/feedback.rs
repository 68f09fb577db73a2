// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Feedback creation collaborator.

use async_trait::async_trait;

use crate::error::IntervoxError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{FeedbackOutcome, FeedbackRequest};

/// Turns an interview transcript into stored feedback.
#[async_trait]
pub trait FeedbackStore: PluginAdapter {
    async fn create_feedback(
        &self,
        request: &FeedbackRequest,
    ) -> Result<FeedbackOutcome, IntervoxError>;
}
