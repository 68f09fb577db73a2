// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Feedback creation over `POST {base}/feedback`.

use std::time::Duration;

use async_trait::async_trait;
use intervox_config::model::ApiConfig;
use intervox_core::traits::{FeedbackStore, PluginAdapter};
use intervox_core::types::{AdapterType, FeedbackOutcome, FeedbackRequest, HealthStatus};
use intervox_core::IntervoxError;
use tracing::debug;

use crate::client::{build_client, endpoint};

/// HTTP client for the feedback collaborator.
#[derive(Debug, Clone)]
pub struct HttpFeedbackStore {
    client: reqwest::Client,
    url: String,
}

impl HttpFeedbackStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, IntervoxError> {
        Ok(Self {
            client: build_client(timeout, None)?,
            url: endpoint(base_url, "feedback"),
        })
    }

    pub fn from_config(api: &ApiConfig) -> Result<Self, IntervoxError> {
        Self::new(&api.app_base_url, Duration::from_secs(api.request_timeout_secs))
    }
}

#[async_trait]
impl PluginAdapter for HttpFeedbackStore {
    fn name(&self) -> &str {
        "http-feedback"
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
impl FeedbackStore for HttpFeedbackStore {
    async fn create_feedback(
        &self,
        request: &FeedbackRequest,
    ) -> Result<FeedbackOutcome, IntervoxError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| IntervoxError::Submission {
                message: format!("feedback request failed: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "feedback API responded");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IntervoxError::submission(
                format!("feedback API returned {status}: {body}"),
                Some(status.as_u16()),
            ));
        }

        response
            .json::<FeedbackOutcome>()
            .await
            .map_err(|e| IntervoxError::Submission {
                message: format!("failed to parse feedback reply: {e}"),
                status: Some(status.as_u16()),
                source: Some(Box::new(e)),
            })
    }
}
