// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router tests driven with `tower::ServiceExt::oneshot` against mock backends.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use intervox_api::WebBackends;
use intervox_config::model::AccountConfig;
use intervox_core::types::{CallEvent, CallVariables, Redirect, SessionId};
use intervox_core::{CallBackend, Speaker};
use intervox_gateway::{router, AuthConfig, GatewayState, WEBHOOK_SECRET_HEADER};
use intervox_resilience::{BackendFactory, StatusMonitor};
use intervox_test_utils::{scripted_call, TestHarness};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAYLOAD: &str = r#"INTERVIEW_DATA: {"type":"technical","role":"Data Engineer","level":"senior","techstack":"Python, Spark","amount":6}"#;

fn state(harness: &TestHarness, token: Option<&str>) -> GatewayState {
    GatewayState {
        monitor: StatusMonitor::new(Arc::clone(&harness.pool)),
        controller: Arc::clone(&harness.controller),
        registry: Arc::clone(&harness.registry),
        webhooks: None,
        auth: AuthConfig {
            bearer_token: token.map(str::to_string),
            webhook_secret: None,
        },
    }
}

fn app(harness: &TestHarness) -> Router {
    router(state(harness, None))
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn generate_request() -> Value {
    json!({"user_name": "Ada", "user_id": "user-1", "session_type": "generate"})
}

#[tokio::test]
async fn health_is_public_and_reports_recommendation() {
    let harness = TestHarness::builder().build().unwrap();
    let app = router(state(&harness, Some("secret")));

    let (status, body) = send(app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["recommendation"].is_string());
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn health_degrades_when_every_account_is_disabled() {
    let harness = TestHarness::builder()
        .with_accounts(&["ACCOUNT_1"])
        .with_failing_account("ACCOUNT_1")
        .with_error_threshold(1)
        .build()
        .unwrap();

    let (status, _) = send(app(&harness), post_json("/v1/calls", generate_request())).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, body) = send(app(&harness), get("/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
}

#[tokio::test]
async fn api_routes_require_bearer_token_when_configured() {
    let harness = TestHarness::builder().build().unwrap();
    let app = router(state(&harness, Some("secret")));

    let res = app.clone().oneshot(get("/v1/accounts")).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let wrong = Request::builder()
        .uri("/v1/accounts")
        .header("authorization", "Bearer nope")
        .body(Body::empty())
        .unwrap();
    let res = app.clone().oneshot(wrong).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let right = Request::builder()
        .uri("/v1/accounts")
        .header("authorization", "Bearer secret")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, right).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn summary_and_reset_reflect_pool_state() {
    let harness = TestHarness::builder()
        .with_accounts(&["ACCOUNT_1", "ACCOUNT_2"])
        .with_failing_account("ACCOUNT_1")
        .with_script(scripted_call(&[(Speaker::Assistant, PAYLOAD)]))
        .build()
        .unwrap();

    let (status, body) = send(app(&harness), post_json("/v1/calls", generate_request())).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["account"], "ACCOUNT_2");

    let (_, accounts) = send(app(&harness), get("/v1/accounts")).await;
    let first = &accounts[0];
    assert_eq!(first["name"], "ACCOUNT_1");
    assert_eq!(first["error_count"], 1);

    let (status, summary) = send(app(&harness), get("/v1/accounts/summary")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["is_healthy"], true);

    let (status, _) = send(
        app(&harness),
        post_json("/v1/accounts/ACCOUNT_1/reset", Value::Null),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, accounts) = send(app(&harness), get("/v1/accounts")).await;
    assert_eq!(accounts[0]["error_count"], 0);

    let (status, body) = send(
        app(&harness),
        post_json("/v1/accounts/ACCOUNT_9/reset", Value::Null),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("ACCOUNT_9"));
}

#[tokio::test]
async fn launched_call_runs_to_completion() {
    let harness = TestHarness::builder()
        .with_script(scripted_call(&[
            (Speaker::Assistant, "Which role?"),
            (Speaker::User, "Data engineering, senior."),
            (Speaker::Assistant, PAYLOAD),
        ]))
        .build()
        .unwrap();

    let (status, body) = send(app(&harness), post_json("/v1/calls", generate_request())).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let id = SessionId(body["session_id"].as_str().unwrap().to_string());

    let outcome = tokio::time::timeout(Duration::from_secs(5), harness.wait_for_outcome(&id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.redirect(), Some(&Redirect::RefreshHome));
    assert_eq!(harness.interviews.submission_count().await, 1);

    let (status, snapshot) = send(app(&harness), get(&format!("/v1/calls/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["status"], "FINISHED");
    assert_eq!(snapshot["outcome"]["redirect"]["kind"], "refresh_home");

    let (_, list) = send(app(&harness), get("/v1/calls")).await;
    assert_eq!(list.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn invalid_request_is_bad_request() {
    let harness = TestHarness::builder().build().unwrap();
    let request = json!({"user_name": "Ada", "user_id": "user-1", "session_type": "interview"});

    let (status, body) = send(app(&harness), post_json("/v1/calls", request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    let backend = harness.backend("ACCOUNT_1").unwrap();
    assert_eq!(backend.start_count().await, 0);
}

#[tokio::test]
async fn unknown_call_is_not_found() {
    let harness = TestHarness::builder().build().unwrap();

    let (status, _) = send(app(&harness), get("/v1/calls/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let delete = Request::builder()
        .method("DELETE")
        .uri("/v1/calls/missing")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app(&harness), delete).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_disconnects_a_live_call() {
    let harness = TestHarness::builder()
        .with_script(vec![intervox_core::types::CallEvent::CallStarted])
        .build()
        .unwrap();

    let (_, body) = send(app(&harness), post_json("/v1/calls", generate_request())).await;
    let id = SessionId(body["session_id"].as_str().unwrap().to_string());

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/calls/{id}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app(&harness), delete).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let outcome = tokio::time::timeout(Duration::from_secs(5), harness.wait_for_outcome(&id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.redirect(), Some(&Redirect::Home));
}

/// Provider stub that accepts call starts as `call-1`, `call-2`, ...
async fn provider() -> MockServer {
    struct SequentialIds(AtomicUsize);

    impl wiremock::Respond for SequentialIds {
        fn respond(&self, _: &wiremock::Request) -> ResponseTemplate {
            let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
            ResponseTemplate::new(201).set_body_json(json!({ "id": format!("call-{n}") }))
        }
    }

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/call/web"))
        .respond_with(SequentialIds(AtomicUsize::new(0)))
        .mount(&server)
        .await;
    server
}

fn webhooks(provider: &MockServer) -> Arc<WebBackends> {
    let webhooks = Arc::new(WebBackends::new(&provider.uri(), Duration::from_secs(5), 16));
    webhooks
        .create(&AccountConfig {
            name: "ACCOUNT_1".into(),
            token: "token".into(),
            workflow_id: None,
            assistant_id: None,
        })
        .unwrap();
    webhooks
}

fn webhook(uri: &str, secret: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(secret) = secret {
        builder = builder.header(WEBHOOK_SECRET_HEADER, secret);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn webhooks_route_to_the_named_account_and_call() {
    let harness = TestHarness::builder().build().unwrap();
    let provider = provider().await;
    let webhooks = webhooks(&provider);
    let backend = webhooks.get("ACCOUNT_1").unwrap();
    let assistant = intervox_agent::assistant::interviewer_assistant();
    let mut first = backend.start(&assistant, &CallVariables::new()).await.unwrap();
    let mut second = backend.start(&assistant, &CallVariables::new()).await.unwrap();

    let mut state = state(&harness, None);
    state.webhooks = Some(webhooks);
    let app = router(state);

    let wrapped = json!({"message": {
        "type": "status-update", "status": "in-progress", "call": {"id": second.call_id}
    }});
    let (status, _) = send(app.clone(), post_json("/v1/webhooks/ACCOUNT_1", wrapped)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(second.events.recv().await, Some(CallEvent::CallStarted));
    assert!(first.events.try_recv().is_err());

    let ignored = json!({"type": "conversation-update", "call": {"id": first.call_id}});
    let (status, _) = send(app.clone(), post_json("/v1/webhooks/ACCOUNT_1", ignored)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let ended = json!({"type": "end-of-call-report"});
    let (status, body) = send(app, post_json("/v1/webhooks/ACCOUNT_7", ended)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("ACCOUNT_7"));
}

#[tokio::test]
async fn webhooks_take_the_webhook_secret_not_the_bearer_token() {
    let harness = TestHarness::builder().build().unwrap();
    let provider = provider().await;
    let webhooks = webhooks(&provider);
    let mut call = webhooks
        .get("ACCOUNT_1")
        .unwrap()
        .start(
            &intervox_agent::assistant::interviewer_assistant(),
            &CallVariables::new(),
        )
        .await
        .unwrap();

    let mut state = state(&harness, Some("operator-token"));
    state.auth.webhook_secret = Some("whsec-1".into());
    state.webhooks = Some(webhooks);
    let app = router(state);

    let started = json!({"type": "call-start", "call": {"id": call.call_id}});
    let uri = "/v1/webhooks/ACCOUNT_1";

    let (status, _) = send(app.clone(), webhook(uri, None, started.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(app.clone(), webhook(uri, Some("wrong"), started.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut with_bearer = webhook(uri, None, started.clone());
    with_bearer
        .headers_mut()
        .insert("authorization", "Bearer operator-token".parse().unwrap());
    let (status, _) = send(app.clone(), with_bearer).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(call.events.try_recv().is_err());

    let (status, _) = send(app.clone(), webhook(uri, Some("whsec-1"), started)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(call.events.recv().await, Some(CallEvent::CallStarted));

    let (status, _) = send(app, get("/v1/accounts")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn open_webhooks_ignore_operator_auth() {
    let harness = TestHarness::builder().build().unwrap();
    let provider = provider().await;
    let webhooks = webhooks(&provider);

    let mut state = state(&harness, Some("operator-token"));
    state.webhooks = Some(webhooks);
    let app = router(state);

    let msg = json!({"type": "status-update", "status": "queued", "call": {"id": "call-1"}});
    let (status, _) = send(app, post_json("/v1/webhooks/ACCOUNT_1", msg)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn webhooks_are_not_found_without_provider_backends() {
    let harness = TestHarness::builder().build().unwrap();
    let msg = json!({"type": "status-update", "status": "ended"});

    let (status, _) = send(app(&harness), post_json("/v1/webhooks/ACCOUNT_1", msg)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
