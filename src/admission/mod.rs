//! Admission control subsystem.
//!
//! # Data Flow
//! ```text
//! Request + Identity (from the identity resolver):
//!     → tiers.rs (role → window / max)
//!     → provider.rs (one DecisionProvider call, bounded by a timeout)
//!         local.rs  (in-process sliding window, pattern signals)
//!         remote.rs (JSON over HTTP)
//!     → decision.rs (flags → single DenyReason, bot → shield → rate-limit)
//!     → controller.rs (forward, 403, or 500)
//! ```
//!
//! # Design Decisions
//! - The controller holds no quota state; the provider owns it
//! - Provider failures and timeouts are never read as a deny
//! - The provider handle is built once at startup and injected

pub mod controller;
pub mod decision;
pub mod local;
pub mod provider;
pub mod remote;
pub mod tiers;

use std::sync::Arc;
use std::time::Duration;

pub use controller::{admission_middleware, AdmissionController};
pub use decision::{classify, Decision, DenyReason, Outcome, ProviderVerdict, ReasonFlags};
pub use local::LocalDecisionProvider;
pub use provider::{DecisionProvider, ProviderError, QuotaQuery, RequestContext};
pub use remote::RemoteDecisionProvider;
pub use tiers::{Tier, TierTable};

use crate::config::{AdmissionConfig, ProviderKind};

/// Build the configured decision provider.
pub fn build_provider(config: &AdmissionConfig) -> Result<Arc<dyn DecisionProvider>, ProviderError> {
    match config.provider.kind {
        ProviderKind::Local => Ok(Arc::new(LocalDecisionProvider::from_config(config))),
        ProviderKind::Remote => {
            let endpoint = config.provider.endpoint.clone().ok_or_else(|| {
                ProviderError::Internal("remote provider requires an endpoint".to_string())
            })?;
            let timeout = Duration::from_millis(config.provider.timeout_ms);
            Ok(Arc::new(RemoteDecisionProvider::new(endpoint, timeout)?))
        }
    }
}
