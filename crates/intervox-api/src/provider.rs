// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Web call backend over the call provider's REST surface.
//!
//! Calls are started with `POST {base}/call/web`, which answers with the
//! provider's call id. The provider reports call progress through webhook
//! messages tagged with that id; the gateway feeds them in with
//! [`WebCallBackend::ingest`] and each one maps to at most one [`CallEvent`]
//! on that call's own stream.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use intervox_config::model::{AccountConfig, IntervoxConfig};
use dashmap::mapref::entry::Entry;
use intervox_core::traits::{CallBackend, PluginAdapter, StartedCall};
use intervox_core::types::{
    AdapterType, AssistantConfig, CallEvent, CallVariables, HealthStatus, Speaker, TranscriptType,
};
use intervox_core::IntervoxError;
use intervox_resilience::BackendFactory;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::client::{build_client, endpoint};

/// A webhook message from the call provider, with the call it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderWebhook {
    #[serde(default)]
    pub call: Option<ProviderCall>,
    #[serde(flatten)]
    pub message: ProviderMessage,
}

impl ProviderWebhook {
    pub fn call_id(&self) -> Option<&str> {
        self.call.as_ref().map(|c| c.id.as_str())
    }
}

/// Call reference carried by webhooks and by the call start response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderCall {
    pub id: String,
}

/// Upper bound on calls tracked per account, early routes included.
const MAX_TRACKED_CALLS: usize = 1024;

/// Upper bound on events held for a call whose start has not resolved.
const MAX_EARLY_EVENTS: usize = 256;

/// The kind of webhook message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ProviderMessage {
    /// Call status change: `in-progress`, `ended`, and others that are ignored.
    StatusUpdate { status: String },
    Transcript {
        role: Speaker,
        #[serde(rename = "transcriptType")]
        transcript_type: TranscriptType,
        transcript: String,
    },
    /// Assistant speech `started` / `stopped`.
    SpeechUpdate {
        status: String,
        #[serde(default)]
        role: Option<Speaker>,
    },
    CallStart,
    CallEnd,
    /// The provider stopped hearing from the call.
    Hang,
    Error {
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(other)]
    Other,
}

impl ProviderMessage {
    /// The call event this message stands for, if any.
    pub fn to_event(&self) -> Option<CallEvent> {
        match self {
            ProviderMessage::StatusUpdate { status } => match status.as_str() {
                "in-progress" => Some(CallEvent::CallStarted),
                "ended" => Some(CallEvent::CallEnded),
                _ => None,
            },
            ProviderMessage::Transcript {
                role,
                transcript_type,
                transcript,
            } => Some(CallEvent::Transcript {
                role: *role,
                transcript_type: *transcript_type,
                text: transcript.clone(),
            }),
            ProviderMessage::SpeechUpdate { status, role } => {
                if role.is_some_and(|r| r != Speaker::Assistant) {
                    return None;
                }
                match status.as_str() {
                    "started" => Some(CallEvent::SpeechStarted),
                    "stopped" => Some(CallEvent::SpeechStopped),
                    _ => None,
                }
            }
            ProviderMessage::CallStart => Some(CallEvent::CallStarted),
            ProviderMessage::CallEnd => Some(CallEvent::CallEnded),
            ProviderMessage::Hang => Some(CallEvent::Error {
                details: "provider reported the call hung".to_string(),
            }),
            ProviderMessage::Error { message } => Some(CallEvent::Error {
                details: message
                    .clone()
                    .unwrap_or_else(|| "provider reported an error".to_string()),
            }),
            ProviderMessage::Other => None,
        }
    }
}

/// Where one call's events go.
enum Route {
    /// Events that arrived before `start` learned the call id.
    Early(Vec<CallEvent>),
    Live(mpsc::Sender<CallEvent>),
}

/// Live handle for one provider account.
pub struct WebCallBackend {
    account: String,
    client: reqwest::Client,
    url: String,
    workflow_id: Option<String>,
    assistant_id: Option<String>,
    event_buffer: usize,
    calls: DashMap<String, Route>,
}

impl WebCallBackend {
    pub fn new(
        account: &AccountConfig,
        provider_base_url: &str,
        timeout: Duration,
        event_buffer: usize,
    ) -> Result<Self, IntervoxError> {
        if !account.has_token() {
            return Err(IntervoxError::Config(format!(
                "account {} has no provider token",
                account.name
            )));
        }
        Ok(Self {
            account: account.name.clone(),
            client: build_client(timeout, Some(account.token.trim()))?,
            url: endpoint(provider_base_url, "call/web"),
            workflow_id: account.workflow_id.clone(),
            assistant_id: account.assistant_id.clone(),
            event_buffer: event_buffer.max(1),
            calls: DashMap::new(),
        })
    }

    /// Feeds one webhook message in. Returns whether it produced an event
    /// for a call.
    ///
    /// Waits while the call's stream is full, so a slow consumer holds the
    /// webhook back instead of losing events.
    pub async fn ingest(&self, webhook: &ProviderWebhook) -> bool {
        let Some(event) = webhook.message.to_event() else {
            return false;
        };
        let Some(call_id) = webhook.call_id() else {
            warn!(account = %self.account, event = ?event, "provider event without a call id");
            return false;
        };
        let terminal = event.is_terminal();

        let tracked = self.calls.len();
        let sender = match self.calls.entry(call_id.to_string()) {
            Entry::Occupied(mut entry) => match entry.get_mut() {
                Route::Live(sender) => sender.clone(),
                Route::Early(early) => {
                    if early.len() >= MAX_EARLY_EVENTS {
                        warn!(account = %self.account, call_id, "early event buffer full");
                        return false;
                    }
                    early.push(event);
                    return true;
                }
            },
            Entry::Vacant(entry) => {
                if tracked >= MAX_TRACKED_CALLS {
                    warn!(account = %self.account, call_id, "event for an untracked call dropped");
                    return false;
                }
                debug!(account = %self.account, call_id, "event before call start resolved");
                entry.insert(Route::Early(vec![event]));
                return true;
            }
        };

        debug!(account = %self.account, call_id, event = ?event, "provider event");
        let delivered = sender.send(event).await.is_ok();
        if !delivered || terminal {
            self.calls.remove(call_id);
        }
        delivered
    }

    /// Number of calls with a live event stream.
    pub fn live_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|route| matches!(route.value(), Route::Live(_)))
            .count()
    }

    /// Opens the event stream for an accepted call, replaying early events.
    fn open(&self, call_id: &str) -> mpsc::Receiver<CallEvent> {
        let mut route = self
            .calls
            .entry(call_id.to_string())
            .or_insert_with(|| Route::Early(Vec::new()));
        let early = match route.value_mut() {
            Route::Early(early) => std::mem::take(early),
            Route::Live(_) => {
                warn!(account = %self.account, call_id, "provider reused a call id");
                Vec::new()
            }
        };
        let (sender, events) = mpsc::channel(self.event_buffer.max(early.len()));
        let ended = early.iter().any(CallEvent::is_terminal);
        for event in early {
            let _ = sender.try_send(event);
        }
        *route.value_mut() = Route::Live(sender);
        drop(route);

        if ended {
            self.calls.remove(call_id);
        }
        events
    }

    fn start_body(&self, assistant: &AssistantConfig, variables: &CallVariables) -> serde_json::Value {
        let mut body = json!({
            "assistantOverrides": { "variableValues": variables },
        });
        if let Some(workflow_id) = &self.workflow_id {
            body["workflowId"] = json!(workflow_id);
        }
        match &self.assistant_id {
            Some(assistant_id) => body["assistantId"] = json!(assistant_id),
            None => {
                body["assistant"] = json!({
                    "name": assistant.name,
                    "firstMessage": assistant.first_message,
                    "model": {
                        "provider": assistant.model_provider,
                        "model": assistant.model,
                        "messages": [{ "role": "system", "content": assistant.system_prompt }],
                    },
                });
            }
        }
        body
    }
}

impl std::fmt::Debug for WebCallBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebCallBackend")
            .field("account", &self.account)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PluginAdapter for WebCallBackend {
    fn name(&self) -> &str {
        &self.account
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::CallBackend
    }

    async fn health_check(&self) -> Result<HealthStatus, IntervoxError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl CallBackend for WebCallBackend {
    async fn start(
        &self,
        assistant: &AssistantConfig,
        variables: &CallVariables,
    ) -> Result<StartedCall, IntervoxError> {
        let response = self
            .client
            .post(&self.url)
            .json(&self.start_body(assistant, variables))
            .send()
            .await
            .map_err(|e| IntervoxError::Provider {
                message: format!("{}: call start request failed: {e}", self.account),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(account = %self.account, status = %status, "provider rejected call start");
            return Err(IntervoxError::provider(format!(
                "{}: provider returned {status}: {body}",
                self.account
            )));
        }

        let call: ProviderCall = response.json().await.map_err(|e| IntervoxError::Provider {
            message: format!("{}: call start response carried no call id: {e}", self.account),
            source: Some(Box::new(e)),
        })?;

        info!(account = %self.account, call_id = %call.id, "provider accepted call");
        let events = self.open(&call.id);
        Ok(StartedCall {
            call_id: call.id,
            events,
        })
    }

    fn stop(&self, call_id: &str) {
        if let Some((_, Route::Live(sender))) = self.calls.remove(call_id) {
            debug!(account = %self.account, call_id, "stopping call");
            let _ = sender.try_send(CallEvent::CallEnded);
        }
    }
}

/// Builds [`WebCallBackend`]s for the pool and keeps them addressable by
/// account name for webhook ingestion.
pub struct WebBackends {
    provider_base_url: String,
    timeout: Duration,
    event_buffer: usize,
    backends: DashMap<String, Arc<WebCallBackend>>,
}

impl WebBackends {
    pub fn new(provider_base_url: &str, timeout: Duration, event_buffer: usize) -> Self {
        Self {
            provider_base_url: provider_base_url.to_string(),
            timeout,
            event_buffer,
            backends: DashMap::new(),
        }
    }

    pub fn from_config(config: &IntervoxConfig) -> Self {
        Self::new(
            &config.api.provider_base_url,
            Duration::from_secs(config.api.request_timeout_secs),
            config.session.event_buffer,
        )
    }

    pub fn get(&self, account: &str) -> Option<Arc<WebCallBackend>> {
        self.backends.get(account).map(|b| Arc::clone(b.value()))
    }

    /// Routes a webhook message to an account's call. `None` for an unknown
    /// account.
    pub async fn ingest(&self, account: &str, webhook: &ProviderWebhook) -> Option<bool> {
        let backend = self.get(account)?;
        Some(backend.ingest(webhook).await)
    }
}

impl BackendFactory for WebBackends {
    fn create(&self, account: &AccountConfig) -> Result<Arc<dyn CallBackend>, IntervoxError> {
        let backend = Arc::new(WebCallBackend::new(
            account,
            &self.provider_base_url,
            self.timeout,
            self.event_buffer,
        )?);
        self.backends
            .insert(account.name.clone(), Arc::clone(&backend));
        Ok(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn account(assistant_id: Option<&str>) -> AccountConfig {
        AccountConfig {
            name: "ACCOUNT_1".into(),
            token: "tok-1".into(),
            workflow_id: Some("wf-1".into()),
            assistant_id: assistant_id.map(str::to_string),
        }
    }

    fn assistant() -> AssistantConfig {
        AssistantConfig {
            name: "Interview Builder".into(),
            first_message: "Hello!".into(),
            system_prompt: "Collect the details.".into(),
            model_provider: "openai".into(),
            model: "gpt-4".into(),
        }
    }

    fn parse(json: serde_json::Value) -> ProviderMessage {
        serde_json::from_value(json).unwrap()
    }

    fn webhook(call_id: &str, message: serde_json::Value) -> ProviderWebhook {
        let mut body = message;
        body["call"] = json!({ "id": call_id });
        serde_json::from_value(body).unwrap()
    }

    fn transcript(call_id: &str, text: &str) -> ProviderWebhook {
        webhook(
            call_id,
            json!({"type": "transcript", "role": "user", "transcriptType": "final", "transcript": text}),
        )
    }

    /// Answers call starts with `call-1`, `call-2`, ... in order.
    struct SequentialIds(std::sync::atomic::AtomicUsize);

    impl wiremock::Respond for SequentialIds {
        fn respond(&self, _: &wiremock::Request) -> ResponseTemplate {
            let n = self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
            ResponseTemplate::new(201).set_body_json(json!({ "id": format!("call-{n}") }))
        }
    }

    async fn provider() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/call/web"))
            .respond_with(SequentialIds(std::sync::atomic::AtomicUsize::new(0)))
            .mount(&server)
            .await;
        server
    }

    fn said(text: &str) -> CallEvent {
        CallEvent::Transcript {
            role: Speaker::User,
            transcript_type: TranscriptType::Final,
            text: text.into(),
        }
    }

    #[tokio::test]
    async fn start_posts_inline_assistant_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/call/web"))
            .and(header("authorization", "Bearer tok-1"))
            .and(body_partial_json(json!({
                "workflowId": "wf-1",
                "assistant": { "name": "Interview Builder", "model": { "model": "gpt-4" } },
                "assistantOverrides": { "variableValues": { "username": "Ada" } }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "call-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let backend =
            WebCallBackend::new(&account(None), &server.uri(), Duration::from_secs(5), 16).unwrap();
        let vars = CallVariables::new().with("username", "Ada");
        let call = backend.start(&assistant(), &vars).await.unwrap();
        assert_eq!(call.call_id, "call-1");
        assert_eq!(backend.live_calls(), 1);
    }

    #[tokio::test]
    async fn configured_assistant_id_replaces_inline_assistant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/call/web"))
            .and(body_partial_json(json!({ "assistantId": "as-9" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "call-9"})))
            .expect(1)
            .mount(&server)
            .await;

        let backend =
            WebCallBackend::new(&account(Some("as-9")), &server.uri(), Duration::from_secs(5), 16)
                .unwrap();
        backend.start(&assistant(), &CallVariables::new()).await.unwrap();
    }

    #[tokio::test]
    async fn rejected_start_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/call/web"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&server)
            .await;

        let backend =
            WebCallBackend::new(&account(None), &server.uri(), Duration::from_secs(5), 16).unwrap();
        let err = backend.start(&assistant(), &CallVariables::new()).await.unwrap_err();
        assert!(matches!(err, IntervoxError::Provider { .. }));
        assert!(err.to_string().contains("ACCOUNT_1"), "got: {err}");
    }

    #[tokio::test]
    async fn start_response_without_call_id_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/call/web"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"status": "queued"})))
            .mount(&server)
            .await;

        let backend =
            WebCallBackend::new(&account(None), &server.uri(), Duration::from_secs(5), 16).unwrap();
        let err = backend.start(&assistant(), &CallVariables::new()).await.unwrap_err();
        assert!(err.to_string().contains("no call id"), "got: {err}");
        assert_eq!(backend.live_calls(), 0);
    }

    #[test]
    fn webhook_messages_map_to_events() {
        let started = parse(json!({"type": "status-update", "status": "in-progress"}));
        assert_eq!(started.to_event(), Some(CallEvent::CallStarted));

        let ended = parse(json!({"type": "status-update", "status": "ended"}));
        assert_eq!(ended.to_event(), Some(CallEvent::CallEnded));

        let queued = parse(json!({"type": "status-update", "status": "queued"}));
        assert_eq!(queued.to_event(), None);

        let transcript = parse(json!({
            "type": "transcript",
            "role": "user",
            "transcriptType": "final",
            "transcript": "I want a backend interview"
        }));
        assert_eq!(transcript.to_event(), Some(said("I want a backend interview")));

        let speech = parse(json!({"type": "speech-update", "status": "started", "role": "assistant"}));
        assert_eq!(speech.to_event(), Some(CallEvent::SpeechStarted));
        let user_speech = parse(json!({"type": "speech-update", "status": "started", "role": "user"}));
        assert_eq!(user_speech.to_event(), None);

        let hang = parse(json!({"type": "hang"}));
        assert!(matches!(hang.to_event(), Some(CallEvent::Error { .. })));

        let unknown = parse(json!({"type": "function-call", "functionCall": {}}));
        assert_eq!(unknown, ProviderMessage::Other);
        assert_eq!(unknown.to_event(), None);
    }

    #[test]
    fn webhook_carries_the_call_id() {
        let tagged = webhook("call-7", json!({"type": "status-update", "status": "ended"}));
        assert_eq!(tagged.call_id(), Some("call-7"));
        assert_eq!(tagged.message.to_event(), Some(CallEvent::CallEnded));

        let untagged: ProviderWebhook =
            serde_json::from_value(json!({"type": "error", "message": "socket closed"})).unwrap();
        assert_eq!(untagged.call_id(), None);
    }

    #[tokio::test]
    async fn concurrent_calls_on_one_account_get_their_own_events() {
        let server = provider().await;
        let backend =
            WebCallBackend::new(&account(None), &server.uri(), Duration::from_secs(5), 8).unwrap();
        let mut first = backend.start(&assistant(), &CallVariables::new()).await.unwrap();
        let mut second = backend.start(&assistant(), &CallVariables::new()).await.unwrap();
        assert_ne!(first.call_id, second.call_id);

        assert!(backend.ingest(&transcript(&first.call_id, "backend role")).await);
        assert!(backend.ingest(&transcript(&second.call_id, "frontend role")).await);

        assert_eq!(first.events.recv().await, Some(said("backend role")));
        assert_eq!(second.events.recv().await, Some(said("frontend role")));

        backend.stop(&first.call_id);
        assert_eq!(first.events.recv().await, Some(CallEvent::CallEnded));
        assert_eq!(first.events.recv().await, None);
        assert!(second.events.try_recv().is_err());
        assert_eq!(backend.live_calls(), 1);

        assert!(backend.ingest(&transcript(&second.call_id, "still here")).await);
        assert_eq!(second.events.recv().await, Some(said("still here")));
    }

    #[tokio::test]
    async fn events_before_start_resolves_are_replayed_in_order() {
        let server = provider().await;
        let backend =
            WebCallBackend::new(&account(None), &server.uri(), Duration::from_secs(5), 8).unwrap();

        let started = webhook("call-1", json!({"type": "status-update", "status": "in-progress"}));
        assert!(backend.ingest(&started).await);
        assert!(backend.ingest(&transcript("call-1", "hello")).await);
        assert_eq!(backend.live_calls(), 0);

        let mut call = backend.start(&assistant(), &CallVariables::new()).await.unwrap();
        assert_eq!(call.call_id, "call-1");
        assert_eq!(call.events.recv().await, Some(CallEvent::CallStarted));
        assert_eq!(call.events.recv().await, Some(said("hello")));
    }

    #[tokio::test]
    async fn terminal_event_closes_the_call_stream() {
        let server = provider().await;
        let backend =
            WebCallBackend::new(&account(None), &server.uri(), Duration::from_secs(5), 8).unwrap();
        let mut call = backend.start(&assistant(), &CallVariables::new()).await.unwrap();

        let error = webhook(&call.call_id, json!({"type": "error", "message": "socket closed"}));
        assert!(backend.ingest(&error).await);
        assert_eq!(
            call.events.recv().await,
            Some(CallEvent::Error {
                details: "socket closed".into()
            })
        );
        assert_eq!(call.events.recv().await, None);
        assert_eq!(backend.live_calls(), 0);
    }

    #[tokio::test]
    async fn full_stream_holds_webhooks_back_instead_of_dropping() {
        let server = provider().await;
        let backend = Arc::new(
            WebCallBackend::new(&account(None), &server.uri(), Duration::from_secs(5), 2).unwrap(),
        );
        let mut call = backend.start(&assistant(), &CallVariables::new()).await.unwrap();

        let feeder = {
            let backend = Arc::clone(&backend);
            let call_id = call.call_id.clone();
            tokio::spawn(async move {
                for n in 0..20 {
                    assert!(backend.ingest(&transcript(&call_id, &format!("turn {n}"))).await);
                }
            })
        };

        for n in 0..20 {
            assert_eq!(call.events.recv().await, Some(said(&format!("turn {n}"))));
        }
        feeder.await.unwrap();
    }

    #[tokio::test]
    async fn ingest_routes_by_account_then_call() {
        let server = provider().await;
        let backends = WebBackends::new(&server.uri(), Duration::from_secs(5), 8);
        let handle = backends.create(&account(None)).unwrap();
        let mut call = handle.start(&assistant(), &CallVariables::new()).await.unwrap();

        let ended = webhook(&call.call_id, json!({"type": "call-end"}));
        assert_eq!(backends.ingest("ACCOUNT_9", &ended).await, None);
        let untagged: ProviderWebhook =
            serde_json::from_value(json!({"type": "call-end"})).unwrap();
        assert_eq!(backends.ingest("ACCOUNT_1", &untagged).await, Some(false));
        let queued = webhook(&call.call_id, json!({"type": "status-update", "status": "queued"}));
        assert_eq!(backends.ingest("ACCOUNT_1", &queued).await, Some(false));

        assert_eq!(backends.ingest("ACCOUNT_1", &ended).await, Some(true));
        assert_eq!(call.events.recv().await, Some(CallEvent::CallEnded));
    }

    #[test]
    fn account_without_token_is_refused() {
        let mut config = account(None);
        config.token = "  ".into();
        assert!(WebCallBackend::new(&config, "http://h", Duration::from_secs(1), 8).is_err());
    }
}
