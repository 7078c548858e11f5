//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the decision provider, identity resolver, and admission controller
//! - Create the Axum router with the admission pipeline in front of every route
//! - Wire up cross-cutting layers (request ID, tracing, timeout)
//! - Serve with graceful shutdown and periodic quota housekeeping

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admission::{
    admission_middleware, build_provider, AdmissionController, DecisionProvider, ProviderError,
    TierTable,
};
use crate::config::GatewayConfig;
use crate::http::handlers;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::identity::{identity_middleware, IdentityResolver};

/// How often expired quota state is purged from the provider.
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<IdentityResolver>,
    pub controller: Arc<AdmissionController>,
}

impl AppState {
    /// Assemble the pipeline around an already-built provider.
    pub fn new(config: &GatewayConfig, provider: Arc<dyn DecisionProvider>) -> Self {
        let resolver = IdentityResolver::from_config(&config.auth);
        let controller = AdmissionController::new(
            TierTable::from_config(&config.admission.tiers),
            provider,
            Duration::from_millis(config.admission.provider.timeout_ms),
        )
        .trust_forwarded_for(config.auth.trust_forwarded_for);

        Self {
            resolver: Arc::new(resolver),
            controller: Arc::new(controller),
        }
    }
}

/// HTTP server for the admission gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    provider: Arc<dyn DecisionProvider>,
}

impl HttpServer {
    /// Create a server using the provider named in the configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, ProviderError> {
        let provider = build_provider(&config.admission)?;
        Ok(Self::with_provider(config, provider))
    }

    /// Create a server around an injected provider.
    pub fn with_provider(config: GatewayConfig, provider: Arc<dyn DecisionProvider>) -> Self {
        let state = AppState::new(&config, provider.clone());
        let router = build_router(&config, state);
        Self {
            router,
            config,
            provider,
        }
    }

    /// The fully layered router, e.g. for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let purge_shutdown = shutdown.resubscribe();
        tokio::spawn(purge_loop(self.provider.clone(), purge_shutdown));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
///
/// Layers run outside-in: request ID, tracing, timeout, identity, admission.
#[allow(deprecated)]
pub fn build_router(config: &GatewayConfig, state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/me", get(handlers::me))
        .route("/api/v1/admin/overview", get(handlers::admin_overview))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.controller.clone(),
            admission_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.resolver.clone(),
            identity_middleware,
        ))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(set_request_id_layer())
}

async fn purge_loop(provider: Arc<dyn DecisionProvider>, mut shutdown: broadcast::Receiver<()>) {
    let mut ticker = tokio::time::interval(PURGE_INTERVAL);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let purged = provider.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, "Purged expired quota windows");
                }
            }
            _ = shutdown.recv() => break,
        }
    }
}
