//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::fmt::Debug;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use admission_gateway::admission::DecisionProvider;
use admission_gateway::config::GatewayConfig;
use admission_gateway::identity::{Claims, Principal, Role, TokenSigner};
use admission_gateway::{HttpServer, Shutdown};
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{request, Request, StatusCode};
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceExt;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

pub const SECRET: &str = "integration-test-secret-at-least-32-chars";

pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.auth.jwt_secret = SECRET.to_string();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config
}

pub fn principal(role: Role) -> Principal {
    Principal {
        subject_id: 1001,
        email: format!("{role}@example.com"),
        role,
    }
}

pub fn token_for(role: Role) -> String {
    TokenSigner::new(SECRET)
        .issue(&principal(role), Duration::from_secs(600))
        .unwrap()
}

pub fn expired_token(role: Role) -> String {
    let now = jsonwebtoken::get_current_timestamp();
    let p = principal(role);
    TokenSigner::new(SECRET)
        .sign(&Claims {
            sub: p.subject_id,
            email: p.email,
            role,
            iat: now - 7200,
            exp: now - 3600,
        })
        .unwrap()
}

/// Request builder with a peer address attached, as the real server would.
pub fn request_from(ip: &str, method: &str, path: &str) -> request::Builder {
    let addr: SocketAddr = format!("{ip}:40000").parse().unwrap();
    Request::builder()
        .method(method)
        .uri(path)
        .extension(ConnectInfo(addr))
}

pub fn get(path: &str) -> request::Builder {
    request_from("192.0.2.1", "GET", path)
}

/// Drive the router in-process and decode a JSON body when there is one.
pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, body)
}

pub fn router_with(config: GatewayConfig, provider: Arc<dyn DecisionProvider>) -> Router {
    HttpServer::with_provider(config, provider).router()
}

pub fn default_router() -> Router {
    HttpServer::new(test_config()).unwrap().router()
}

/// A gateway bound to an ephemeral port. Shuts down on drop.
pub struct TestServer {
    pub base_url: String,
    shutdown: Shutdown,
}

impl TestServer {
    pub async fn spawn(config: GatewayConfig) -> Self {
        Self::start(HttpServer::new(config).unwrap()).await
    }

    pub async fn spawn_with_provider(config: GatewayConfig, provider: Arc<dyn DecisionProvider>) -> Self {
        Self::start(HttpServer::with_provider(config, provider)).await
    }

    async fn start(server: HttpServer) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let shutdown = Shutdown::new();
        let server_shutdown = shutdown.subscribe();

        tokio::spawn(async move {
            let _ = server.run(listener, server_shutdown).await;
        });

        Self { base_url, shutdown }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Serve `router` on an ephemeral port (e.g. a fake decision service).
pub async fn spawn_service(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// One captured log event.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
}

/// Collects events emitted on the current thread while its guard is alive.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<CapturedEvent>>>);

impl CapturedLogs {
    pub fn at_level(&self, level: Level) -> Vec<CapturedEvent> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.level == level)
            .cloned()
            .collect()
    }
}

impl<S: Subscriber> Layer<S> for CapturedLogs {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.0.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.0,
        });
    }
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

/// Install a capturing subscriber for this thread.
pub fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::registry().with(logs.clone());
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}
