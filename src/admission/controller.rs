//! Admission controller and its middleware.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::admission::decision::{classify, Decision};
use crate::admission::provider::{DecisionProvider, ProviderError, QuotaQuery, RequestContext};
use crate::admission::tiers::{Tier, TierTable};
use crate::http::response::Rejection;
use crate::identity::Identity;
use crate::observability::metrics;

/// Maps identities to tiers and asks the decision provider for a verdict.
pub struct AdmissionController {
    tiers: TierTable,
    provider: Arc<dyn DecisionProvider>,
    timeout: Duration,
    trust_forwarded_for: bool,
}

impl AdmissionController {
    pub fn new(tiers: TierTable, provider: Arc<dyn DecisionProvider>, timeout: Duration) -> Self {
        Self {
            tiers,
            provider,
            timeout,
            trust_forwarded_for: false,
        }
    }

    pub fn trust_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }

    pub fn tier_for(&self, identity: &Identity) -> &Tier {
        self.tiers.lookup(identity.role())
    }

    /// One provider call, bounded by the configured timeout. No retries.
    pub async fn admit(
        &self,
        ctx: &RequestContext,
        identity: &Identity,
    ) -> Result<Decision, ProviderError> {
        let tier = self.tier_for(identity);
        let query = QuotaQuery {
            rule_key: tier.name,
            window: tier.window,
            max: tier.max_requests,
        };

        let start = Instant::now();
        let result = tokio::time::timeout(self.timeout, self.provider.decide(&query, ctx)).await;
        metrics::record_provider_latency(start);

        let verdict = result.map_err(|_| ProviderError::Timeout(self.timeout))??;
        let decision = classify(&verdict);
        metrics::record_decision(tier.name, &decision);
        Ok(decision)
    }
}

/// Middleware enforcing admission after identity resolution.
///
/// Requests without an attached identity are admitted under the guest tier.
pub async fn admission_middleware(
    State(controller): State<Arc<AdmissionController>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let identity = req
        .extensions()
        .get::<Identity>()
        .cloned()
        .unwrap_or(Identity::Anonymous);
    let ctx = RequestContext::from_request(&req, controller.trust_forwarded_for);

    match controller.admit(&ctx, &identity).await {
        Ok(Decision::Allow) => next.run(req).await,
        Ok(Decision::Deny(reason)) => {
            tracing::warn!(
                request_id = %ctx.request_id,
                client_ip = %ctx.ip,
                user_agent = ctx.user_agent.as_deref().unwrap_or("-"),
                path = %ctx.path,
                tier = controller.tier_for(&identity).name,
                reason = reason.as_str(),
                "Request denied by admission control"
            );
            Rejection::Denied(reason).into_response()
        }
        Err(e) => {
            tracing::error!(
                request_id = %ctx.request_id,
                client_ip = %ctx.ip,
                path = %ctx.path,
                error = %e,
                "Decision provider failed"
            );
            metrics::record_provider_failure(e.kind());
            Rejection::ProviderFailure.into_response()
        }
    }
}
