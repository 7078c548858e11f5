//! End-to-end tests over a real listener.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use admission_gateway::admission::{
    DecisionProvider, ProviderError, QuotaQuery, RemoteDecisionProvider, RequestContext,
};
use admission_gateway::config::ProviderKind;
use admission_gateway::identity::Role;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use common::*;
use serde_json::{json, Value};

type Seen = Arc<Mutex<Vec<Value>>>;

/// Fake decision service: records request bodies and answers per route.
async fn decision_service() -> (String, Seen) {
    async fn allow(State(seen): State<Seen>, Json(body): Json<Value>) -> Json<Value> {
        seen.lock().unwrap().push(body);
        Json(json!({ "outcome": "allow" }))
    }

    async fn shield(State(seen): State<Seen>, Json(body): Json<Value>) -> Json<Value> {
        seen.lock().unwrap().push(body);
        Json(json!({
            "outcome": "deny",
            "reasons": { "is_shield": true, "is_rate_limit": true }
        }))
    }

    async fn broken() -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    async fn garbage() -> &'static str {
        "definitely not a verdict"
    }

    async fn slow() -> Json<Value> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Json(json!({ "outcome": "allow" }))
    }

    let seen = Seen::default();
    let router = Router::new()
        .route("/allow", post(allow))
        .route("/shield", post(shield))
        .route("/broken", post(broken))
        .route("/garbage", post(garbage))
        .route("/slow", post(slow))
        .with_state(seen.clone());

    (spawn_service(router).await, seen)
}

fn remote_config(endpoint: String, timeout_ms: u64) -> admission_gateway::GatewayConfig {
    let mut config = test_config();
    config.admission.provider.kind = ProviderKind::Remote;
    config.admission.provider.endpoint = Some(endpoint);
    config.admission.provider.timeout_ms = timeout_ms;
    config
}

fn sample_context() -> RequestContext {
    RequestContext {
        ip: "203.0.113.9".parse().unwrap(),
        method: "GET".into(),
        path: "/health".into(),
        query: None,
        user_agent: Some("curl/8.0".into()),
        request_id: "test".into(),
    }
}

fn guest_query() -> QuotaQuery {
    QuotaQuery {
        rule_key: "guest",
        window: Duration::from_secs(60),
        max: 5,
    }
}

#[tokio::test]
async fn test_admin_post_burst_over_tcp() {
    let server = TestServer::spawn(test_config()).await;
    let client = reqwest::Client::new();
    let token = token_for(Role::Admin);

    for i in 0..20 {
        let response = client
            .post(server.url("/api/v1/me"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        // Admitted, then rejected by the router: `/api/v1/me` is GET-only.
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "request {}", i + 1);
    }

    let response = client
        .post(server.url("/api/v1/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(response.headers().contains_key("x-request-id"));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["reason"], "rate-limit");
}

#[tokio::test]
async fn test_me_over_tcp() {
    let server = TestServer::spawn(test_config()).await;
    let client = reqwest::Client::new();

    let anonymous = client.get(server.url("/api/v1/me")).send().await.unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .get(server.url("/api/v1/me"))
        .header("cookie", format!("token={}", token_for(Role::User)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email"], "user@example.com");
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn test_remote_provider_receives_tier_and_context() {
    let (service, seen) = decision_service().await;
    let server = TestServer::spawn(remote_config(format!("{service}/allow"), 2000)).await;
    let client = reqwest::Client::new();

    let response = client
        .get(server.url("/health?probe=1"))
        .bearer_auth(token_for(Role::Admin))
        .header("user-agent", "integration-suite")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let body = &seen[0];
    assert_eq!(body["rule_key"], "admin");
    assert_eq!(body["window_secs"], 60);
    assert_eq!(body["max"], 20);
    assert_eq!(body["request"]["ip"], "127.0.0.1");
    assert_eq!(body["request"]["method"], "GET");
    assert_eq!(body["request"]["path"], "/health");
    assert_eq!(body["request"]["query"], "probe=1");
    assert_eq!(body["request"]["user_agent"], "integration-suite");
}

#[tokio::test]
async fn test_remote_deny_maps_to_403() {
    let (service, _) = decision_service().await;
    let server = TestServer::spawn(remote_config(format!("{service}/shield"), 2000)).await;

    let response = reqwest::get(server.url("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["reason"], "policy-shield");
}

#[tokio::test]
async fn test_remote_failures_map_to_500() {
    let (service, _) = decision_service().await;

    for path in ["/broken", "/garbage", "/slow"] {
        let server = TestServer::spawn(remote_config(format!("{service}{path}"), 200)).await;
        let response = reqwest::get(server.url("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{path}");
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }
}

#[tokio::test]
async fn test_remote_provider_error_kinds() {
    let (service, _) = decision_service().await;
    let timeout = Duration::from_millis(200);

    let status = RemoteDecisionProvider::new(format!("{service}/broken"), timeout).unwrap();
    let err = status.decide(&guest_query(), &sample_context()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Status(500)));

    let decode = RemoteDecisionProvider::new(format!("{service}/garbage"), timeout).unwrap();
    let err = decode.decide(&guest_query(), &sample_context()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Decode(_)));

    let slow = RemoteDecisionProvider::new(format!("{service}/slow"), timeout).unwrap();
    let err = slow.decide(&guest_query(), &sample_context()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Timeout(_)));

    let unreachable = RemoteDecisionProvider::new("http://127.0.0.1:1/decide", timeout).unwrap();
    let err = unreachable.decide(&guest_query(), &sample_context()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Transport(_) | ProviderError::Timeout(_)));
}
