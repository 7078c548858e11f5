//! Decision provider interface.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::Request;
use serde::Serialize;
use thiserror::Error;

use crate::admission::decision::ProviderVerdict;
use crate::http::request;

/// A sliding-window quota query for one tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaQuery {
    /// Tier name; together with the client IP it keys the window.
    pub rule_key: &'static str,
    pub window: Duration,
    pub max: u32,
}

/// Network identity and request details handed to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestContext {
    pub ip: IpAddr,
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub user_agent: Option<String>,
    #[serde(skip)]
    pub request_id: String,
}

impl RequestContext {
    pub fn from_request<B>(req: &Request<B>, trust_forwarded_for: bool) -> Self {
        Self {
            ip: request::client_ip(req, trust_forwarded_for),
            method: req.method().to_string(),
            path: req.uri().path().to_string(),
            query: req.uri().query().map(str::to_string),
            user_agent: request::user_agent(req).map(str::to_string),
            request_id: request::request_id(req).to_string(),
        }
    }
}

/// Failure to obtain a verdict. Never treated as a deny.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("decision provider timed out after {0:?}")]
    Timeout(Duration),

    #[error("decision provider unreachable: {0}")]
    Transport(String),

    #[error("decision provider returned status {0}")]
    Status(u16),

    #[error("decision provider response could not be decoded: {0}")]
    Decode(String),

    #[error("decision provider failed: {0}")]
    Internal(String),
}

impl ProviderError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Timeout(_) => "timeout",
            ProviderError::Transport(_) => "transport",
            ProviderError::Status(_) => "status",
            ProviderError::Decode(_) => "decode",
            ProviderError::Internal(_) => "internal",
        }
    }
}

/// Evaluates bot, shield, and quota signals for a request.
///
/// Implementations own all quota state; callers make exactly one call per
/// request and do not retry.
#[async_trait]
pub trait DecisionProvider: Send + Sync {
    async fn decide(
        &self,
        query: &QuotaQuery,
        ctx: &RequestContext,
    ) -> Result<ProviderVerdict, ProviderError>;

    /// Drop expired quota state. Returns the number of entries removed.
    fn purge_expired(&self) -> usize {
        0
    }
}
