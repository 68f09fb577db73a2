// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interview creation collaborator.

use async_trait::async_trait;

use crate::error::IntervoxError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CreateInterviewRequest, CreatedInterview};

/// Persists a new interview built from an extracted specification.
#[async_trait]
pub trait InterviewStore: PluginAdapter {
    /// Creates an interview.
    ///
    /// Missing fields are rejected by the collaborator with a client error;
    /// unexpected failures surface as a server error.
    async fn create_interview(
        &self,
        request: &CreateInterviewRequest,
    ) -> Result<CreatedInterview, IntervoxError>;
}
