// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock persistence collaborators.
//!
//! Both stores capture every request they receive. Rejections are queued
//! per call, so a test can reject the first submission and accept the next.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use intervox_core::traits::adapter::PluginAdapter;
use intervox_core::traits::feedback::FeedbackStore;
use intervox_core::traits::interview::InterviewStore;
use intervox_core::types::{
    AdapterType, CreateInterviewRequest, CreatedInterview, FeedbackOutcome, FeedbackRequest,
    HealthStatus,
};
use intervox_core::IntervoxError;

/// A mock interview store that accepts submissions unless told otherwise.
///
/// Accepted interviews get sequential ids `interview-1`, `interview-2`, ...
pub struct MockInterviewStore {
    submissions: Mutex<Vec<CreateInterviewRequest>>,
    rejections: Mutex<VecDeque<u16>>,
    reject_all: AtomicBool,
    next_id: AtomicUsize,
}

impl MockInterviewStore {
    pub fn new() -> Self {
        Self {
            submissions: Mutex::new(Vec::new()),
            rejections: Mutex::new(VecDeque::new()),
            reject_all: AtomicBool::new(false),
            next_id: AtomicUsize::new(1),
        }
    }

    /// Reject the next submission with the given HTTP status.
    pub async fn reject_next(&self, status: u16) {
        self.rejections.lock().await.push_back(status);
    }

    /// Reject every submission with a server error.
    pub fn reject_all(&self) {
        self.reject_all.store(true, Ordering::SeqCst);
    }

    /// Every request received, accepted or not.
    pub async fn submissions(&self) -> Vec<CreateInterviewRequest> {
        self.submissions.lock().await.clone()
    }

    pub async fn submission_count(&self) -> usize {
        self.submissions.lock().await.len()
    }
}

impl Default for MockInterviewStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockInterviewStore {
    fn name(&self) -> &str {
        "mock-interviews"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::InterviewStore
    }

    async fn health_check(&self) -> Result<HealthStatus, IntervoxError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl InterviewStore for MockInterviewStore {
    async fn create_interview(
        &self,
        request: &CreateInterviewRequest,
    ) -> Result<CreatedInterview, IntervoxError> {
        self.submissions.lock().await.push(request.clone());

        if let Some(status) = self.rejections.lock().await.pop_front() {
            return Err(IntervoxError::submission("interview rejected", Some(status)));
        }
        if self.reject_all.load(Ordering::SeqCst) {
            return Err(IntervoxError::submission("interview store unavailable", Some(500)));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(CreatedInterview {
            interview_id: format!("interview-{id}"),
        })
    }
}

/// A mock feedback store.
///
/// Responses are popped from a FIFO queue. When the queue is empty, a
/// successful outcome with id `feedback-<n>` is returned.
pub struct MockFeedbackStore {
    requests: Mutex<Vec<FeedbackRequest>>,
    responses: Mutex<VecDeque<Result<FeedbackOutcome, String>>>,
    next_id: AtomicUsize,
}

impl MockFeedbackStore {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
            next_id: AtomicUsize::new(1),
        }
    }

    /// Queue an explicit outcome for the next request.
    pub async fn respond_with(&self, outcome: FeedbackOutcome) {
        self.responses.lock().await.push_back(Ok(outcome));
    }

    /// Make the next request fail with a transport-level error.
    pub async fn fail_next(&self, message: impl Into<String>) {
        self.responses.lock().await.push_back(Err(message.into()));
    }

    pub async fn requests(&self) -> Vec<FeedbackRequest> {
        self.requests.lock().await.clone()
    }
}

impl Default for MockFeedbackStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockFeedbackStore {
    fn name(&self) -> &str {
        "mock-feedback"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::FeedbackStore
    }

    async fn health_check(&self) -> Result<HealthStatus, IntervoxError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl FeedbackStore for MockFeedbackStore {
    async fn create_feedback(
        &self,
        request: &FeedbackRequest,
    ) -> Result<FeedbackOutcome, IntervoxError> {
        self.requests.lock().await.push(request.clone());

        match self.responses.lock().await.pop_front() {
            Some(Ok(outcome)) => Ok(outcome),
            Some(Err(message)) => Err(IntervoxError::submission(message, None)),
            None => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                Ok(FeedbackOutcome {
                    success: true,
                    feedback_id: Some(format!("feedback-{id}")),
                })
            }
        }
    }
}
