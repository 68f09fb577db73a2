// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Intervox call orchestrator.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Top-level Intervox configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IntervoxConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Provider pool health policy.
    #[serde(default)]
    pub pool: PoolConfig,

    /// Credentialed provider accounts. When empty, accounts are read from
    /// the `INTERVOX_PROVIDER_*` slot variables instead.
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,

    /// Call session and reconciliation settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Payload submitted when a generation call times out without usable data.
    #[serde(default)]
    pub fallback: FallbackConfig,

    /// Endpoints of the persistence collaborators and the call provider.
    #[serde(default)]
    pub api: ApiConfig,

    /// HTTP status and call-control surface.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name used in logs and health responses.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "intervox".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Provider pool health policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
    /// Failures after which an account is disabled until reset.
    #[serde(default = "default_error_threshold")]
    pub error_threshold: u32,

    /// Seconds between status log lines emitted by the pool monitor.
    #[serde(default = "default_monitor_interval_secs")]
    pub monitor_interval_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            error_threshold: default_error_threshold(),
            monitor_interval_secs: default_monitor_interval_secs(),
        }
    }
}

fn default_error_threshold() -> u32 {
    3
}

fn default_monitor_interval_secs() -> u64 {
    30
}

/// One credentialed call-provider account.
#[derive(Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AccountConfig {
    /// Unique account name, e.g. `ACCOUNT_1`.
    pub name: String,

    /// Credential token. Accounts with an empty token are never selected.
    #[serde(default)]
    pub token: String,

    /// Provider workflow identifier.
    #[serde(default)]
    pub workflow_id: Option<String>,

    /// Provider assistant identifier.
    #[serde(default)]
    pub assistant_id: Option<String>,
}

impl AccountConfig {
    pub fn has_token(&self) -> bool {
        !self.token.trim().is_empty()
    }
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("name", &self.name)
            .field("token", &if self.has_token() { "[REDACTED]" } else { "" })
            .field("workflow_id", &self.workflow_id)
            .field("assistant_id", &self.assistant_id)
            .finish()
    }
}

/// Transcript extraction strategies, in the names used by `session.extractors`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Deserialize, Serialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    /// Marker followed by a JSON payload in the most recent message.
    TaggedPayload,
    /// One prose sentence listing every field in order.
    LabeledSentence,
    /// Each field found on its own anywhere in the transcript.
    IndependentFields,
}

/// Call session and reconciliation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Seconds of call time after which a generation call without a tagged
    /// payload falls back to the default interview.
    #[serde(default = "default_fallback_timeout_secs")]
    pub fallback_timeout_secs: u64,

    /// Extraction strategies, tried in this order.
    #[serde(default = "default_extractors")]
    pub extractors: Vec<ExtractorKind>,

    /// Literal marker the collector assistant prefixes its final payload with.
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Capacity of each call's event stream. A full stream holds webhook
    /// deliveries back until the call catches up.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// Seconds a finished call stays queryable before `serve` drops it.
    #[serde(default = "default_call_retention_secs")]
    pub call_retention_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fallback_timeout_secs: default_fallback_timeout_secs(),
            extractors: default_extractors(),
            marker: default_marker(),
            event_buffer: default_event_buffer(),
            call_retention_secs: default_call_retention_secs(),
        }
    }
}

fn default_fallback_timeout_secs() -> u64 {
    300
}

fn default_extractors() -> Vec<ExtractorKind> {
    vec![
        ExtractorKind::TaggedPayload,
        ExtractorKind::LabeledSentence,
        ExtractorKind::IndependentFields,
    ]
}

fn default_marker() -> String {
    "INTERVIEW_DATA:".to_string()
}

fn default_event_buffer() -> usize {
    64
}

fn default_call_retention_secs() -> u64 {
    600
}

/// Default interview submitted by the timeout fallback.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FallbackConfig {
    /// Interview focus (technical, behavioral, mixed).
    #[serde(rename = "type", default = "default_fallback_type")]
    pub interview_type: String,

    #[serde(default = "default_fallback_role")]
    pub role: String,

    #[serde(default = "default_fallback_level")]
    pub level: String,

    #[serde(default = "default_fallback_techstack")]
    pub techstack: String,

    /// Number of questions.
    #[serde(default = "default_fallback_amount")]
    pub amount: u32,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            interview_type: default_fallback_type(),
            role: default_fallback_role(),
            level: default_fallback_level(),
            techstack: default_fallback_techstack(),
            amount: default_fallback_amount(),
        }
    }
}

fn default_fallback_type() -> String {
    "mixed".to_string()
}

fn default_fallback_role() -> String {
    "Software Developer".to_string()
}

fn default_fallback_level() -> String {
    "junior".to_string()
}

fn default_fallback_techstack() -> String {
    "JavaScript, React".to_string()
}

fn default_fallback_amount() -> u32 {
    10
}

/// Collaborator endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL of the interview/feedback API (`POST {base}/interviews`, `POST {base}/feedback`).
    #[serde(default = "default_app_base_url")]
    pub app_base_url: String,

    /// Base URL of the call provider REST API.
    #[serde(default = "default_provider_base_url")]
    pub provider_base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            app_base_url: default_app_base_url(),
            provider_base_url: default_provider_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_app_base_url() -> String {
    "http://127.0.0.1:3000/api".to_string()
}

fn default_provider_base_url() -> String {
    "https://api.vapi.ai".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Whether `serve` starts the HTTP surface.
    #[serde(default = "default_gateway_enabled")]
    pub enabled: bool,

    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token required on `/v1/*` operator routes. `None` disables auth.
    /// Webhook deliveries never carry it.
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Shared secret the call provider sends in the `x-vapi-secret` header
    /// with every webhook to `/v1/webhooks/{account}`. Set the same value as
    /// the provider's server URL secret. `None` leaves webhooks open.
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: default_gateway_enabled(),
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
            webhook_secret: None,
        }
    }
}

fn default_gateway_enabled() -> bool {
    true
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    3100
}
