//! Configuration validation.
//!
//! Serde handles syntax; this checks value ranges and cross-field
//! requirements. Every problem is reported, not just the first.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{GatewayConfig, ProviderKind, TierConfig};

/// A single semantic problem found in a loaded configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),

    #[error("auth.jwt_secret must not be empty")]
    EmptySecret,

    #[error("auth.cookie_name must not be empty")]
    EmptyCookieName,

    #[error("admission.tiers.{tier}: {reason}")]
    Tier { tier: &'static str, reason: &'static str },

    #[error("admission.provider.timeout_ms must be greater than zero")]
    ProviderTimeout,

    #[error("admission.provider.endpoint is required for the remote provider")]
    MissingEndpoint,

    #[error("admission.provider.endpoint `{0}` is not an http(s) URL")]
    InvalidEndpoint(String),

    #[error("timeouts.request_secs must be greater than zero")]
    RequestTimeout,

    #[error(
        "admission.provider.timeout_ms ({provider_ms}) must be shorter than timeouts.request_secs ({request_secs}s)"
    )]
    ProviderTimeoutExceedsRequest { provider_ms: u64, request_secs: u64 },
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    if config.auth.jwt_secret.is_empty() {
        errors.push(ValidationError::EmptySecret);
    }
    if config.auth.cookie_name.trim().is_empty() {
        errors.push(ValidationError::EmptyCookieName);
    }

    let tiers = &config.admission.tiers;
    for (name, tier) in [("admin", &tiers.admin), ("user", &tiers.user), ("guest", &tiers.guest)] {
        check_tier(name, tier, &mut errors);
    }

    let provider = &config.admission.provider;
    if provider.timeout_ms == 0 {
        errors.push(ValidationError::ProviderTimeout);
    }
    // The request timeout wraps admission; it must not fire before the provider's.
    let request_ms = config.timeouts.request_secs.saturating_mul(1000);
    if request_ms > 0 && provider.timeout_ms >= request_ms {
        errors.push(ValidationError::ProviderTimeoutExceedsRequest {
            provider_ms: provider.timeout_ms,
            request_secs: config.timeouts.request_secs,
        });
    }
    if provider.kind == ProviderKind::Remote {
        match provider.endpoint.as_deref() {
            None => errors.push(ValidationError::MissingEndpoint),
            Some(raw) => match url::Url::parse(raw) {
                Ok(u) if matches!(u.scheme(), "http" | "https") => {}
                _ => errors.push(ValidationError::InvalidEndpoint(raw.to_string())),
            },
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_tier(name: &'static str, tier: &TierConfig, errors: &mut Vec<ValidationError>) {
    if tier.window_secs == 0 {
        errors.push(ValidationError::Tier {
            tier: name,
            reason: "window_secs must be greater than zero",
        });
    }
    if tier.max_requests == 0 {
        errors.push(ValidationError::Tier {
            tier: name,
            reason: "max_requests must be greater than zero",
        });
    }
}
