//! Provider verdicts and their classification into admission decisions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw allow/deny outcome reported by a decision provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Allow,
    Deny,
}

/// Signals raised by a decision provider. Several may be set at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonFlags {
    pub is_bot: bool,
    pub is_shield: bool,
    pub is_rate_limit: bool,
}

/// What a decision provider returns for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderVerdict {
    pub outcome: Outcome,
    #[serde(default, rename = "reasons")]
    pub flags: ReasonFlags,
}

impl ProviderVerdict {
    pub fn allow() -> Self {
        Self {
            outcome: Outcome::Allow,
            flags: ReasonFlags::default(),
        }
    }

    pub fn deny(flags: ReasonFlags) -> Self {
        Self {
            outcome: Outcome::Deny,
            flags,
        }
    }
}

/// The single reason reported for a denied request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenyReason {
    Bot,
    Shield,
    RateLimit,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::Bot => "bot",
            DenyReason::Shield => "policy-shield",
            DenyReason::RateLimit => "rate-limit",
        }
    }

    /// Human-readable message returned to the caller.
    pub fn message(&self) -> &'static str {
        match self {
            DenyReason::Bot => "Automated clients are not allowed",
            DenyReason::Shield => "Request blocked by security policy",
            DenyReason::RateLimit => "Too many requests, slow down",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Admission decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Classify a verdict. Deny reasons are checked bot → shield → rate-limit;
/// a deny with no flag set counts as a generic rate-limit denial. Flags on
/// an allow verdict are ignored.
pub fn classify(verdict: &ProviderVerdict) -> Decision {
    match verdict.outcome {
        Outcome::Allow => Decision::Allow,
        Outcome::Deny => {
            let flags = verdict.flags;
            let reason = if flags.is_bot {
                DenyReason::Bot
            } else if flags.is_shield {
                DenyReason::Shield
            } else {
                DenyReason::RateLimit
            };
            Decision::Deny(reason)
        }
    }
}
