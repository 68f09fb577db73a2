// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interview creation over `POST {base}/interviews`.

use std::time::Duration;

use async_trait::async_trait;
use intervox_config::model::ApiConfig;
use intervox_core::traits::{InterviewStore, PluginAdapter};
use intervox_core::types::{AdapterType, CreateInterviewRequest, CreatedInterview, HealthStatus};
use intervox_core::IntervoxError;
use serde::Deserialize;
use tracing::debug;

use crate::client::{build_client, endpoint};

/// Reply body of the interview API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InterviewReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    interview_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the interview creation collaborator.
#[derive(Debug, Clone)]
pub struct HttpInterviewStore {
    client: reqwest::Client,
    url: String,
}

impl HttpInterviewStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, IntervoxError> {
        Ok(Self {
            client: build_client(timeout, None)?,
            url: endpoint(base_url, "interviews"),
        })
    }

    pub fn from_config(api: &ApiConfig) -> Result<Self, IntervoxError> {
        Self::new(&api.app_base_url, Duration::from_secs(api.request_timeout_secs))
    }
}

#[async_trait]
impl PluginAdapter for HttpInterviewStore {
    fn name(&self) -> &str {
        "http-interviews"
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
impl InterviewStore for HttpInterviewStore {
    async fn create_interview(
        &self,
        request: &CreateInterviewRequest,
    ) -> Result<CreatedInterview, IntervoxError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| IntervoxError::Submission {
                message: format!("interview request failed: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!(status = %status, "interview API responded");

        let reply = serde_json::from_str::<InterviewReply>(&body).ok();
        match reply {
            Some(InterviewReply {
                success: true,
                interview_id: Some(interview_id),
                ..
            }) if status.is_success() => Ok(CreatedInterview { interview_id }),
            Some(InterviewReply { error: Some(error), .. }) => Err(IntervoxError::submission(
                format!("interview API returned {status}: {error}"),
                Some(status.as_u16()),
            )),
            _ => Err(IntervoxError::submission(
                format!("interview API returned {status}: {body}"),
                Some(status.as_u16()),
            )),
        }
    }
}
