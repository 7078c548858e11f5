//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Placeholder secret shipped in the defaults. Startup warns when it is still in use.
pub const PLACEHOLDER_JWT_SECRET: &str = "CHANGE_ME_IN_PRODUCTION";

/// Root configuration for the admission gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Identity token settings.
    pub auth: AuthConfig,

    /// Admission control: tiers and decision provider.
    pub admission: AdmissionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Identity token configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret used to verify (and, in tooling, sign) identity tokens.
    pub jwt_secret: String,

    /// Name of the cookie carrying the token.
    pub cookie_name: String,

    /// Clock skew tolerated when checking `exp`, in seconds.
    pub leeway_secs: u64,

    /// Take the client IP from the first `X-Forwarded-For` entry.
    /// Only enable behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            jwt_secret: PLACEHOLDER_JWT_SECRET.to_string(),
            cookie_name: "token".to_string(),
            leeway_secs: 0,
            trust_forwarded_for: false,
        }
    }
}

/// Admission control configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Per-role quota tiers.
    pub tiers: TiersConfig,

    /// Which decision provider answers quota queries.
    pub provider: ProviderConfig,

    /// Bot signal settings for the local provider.
    pub bot: BotConfig,

    /// Shield signal settings for the local provider.
    pub shield: ShieldConfig,
}

/// Quota tiers keyed by role. Guest also covers any unmapped role.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TiersConfig {
    pub admin: TierConfig,
    pub user: TierConfig,
    pub guest: TierConfig,
}

impl Default for TiersConfig {
    fn default() -> Self {
        Self {
            admin: TierConfig::per_minute(20),
            user: TierConfig::per_minute(10),
            guest: TierConfig::per_minute(5),
        }
    }
}

/// A single sliding-window quota.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct TierConfig {
    /// Window length in seconds.
    pub window_secs: u64,

    /// Maximum requests admitted per window.
    pub max_requests: u32,
}

impl TierConfig {
    pub const fn per_minute(max_requests: u32) -> Self {
        Self {
            window_secs: 60,
            max_requests,
        }
    }
}

/// Decision provider selection.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// In-process sliding window with pattern-based bot/shield signals.
    #[default]
    Local,
    /// JSON-over-HTTP decision service.
    Remote,
}

/// Decision provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,

    /// Decision endpoint URL (remote provider only).
    pub endpoint: Option<String>,

    /// Hard deadline for one decision call, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Local,
            endpoint: None,
            timeout_ms: 2000,
        }
    }
}

/// Bot signal configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BotConfig {
    /// Case-insensitive substrings of the User-Agent that flag a bot.
    pub user_agent_patterns: Vec<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            user_agent_patterns: ["bot", "crawler", "spider", "scrapy", "python-requests"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

/// Shield signal configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShieldConfig {
    /// Case-insensitive substrings of the path or decoded query that flag an attack.
    pub patterns: Vec<String>,
}

impl Default for ShieldConfig {
    fn default() -> Self {
        Self {
            patterns: ["<script", "union select", "../", "' or '1'='1", "/etc/passwd"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
