//! JSON-over-HTTP decision provider.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::admission::decision::ProviderVerdict;
use crate::admission::provider::{DecisionProvider, ProviderError, QuotaQuery, RequestContext};

#[derive(Serialize)]
struct DecisionRequest<'a> {
    rule_key: &'a str,
    window_secs: u64,
    max: u32,
    request: &'a RequestContext,
}

/// Asks an external decision service for a verdict.
///
/// The service owns the quota windows; this client holds no state beyond its
/// connection pool.
pub struct RemoteDecisionProvider {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl RemoteDecisionProvider {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Internal(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }
}

#[async_trait]
impl DecisionProvider for RemoteDecisionProvider {
    async fn decide(
        &self,
        query: &QuotaQuery,
        ctx: &RequestContext,
    ) -> Result<ProviderVerdict, ProviderError> {
        let body = DecisionRequest {
            rule_key: query.rule_key,
            window_secs: query.window.as_secs(),
            max: query.max,
            request: ctx,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(self.timeout)
                } else {
                    ProviderError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        response
            .json::<ProviderVerdict>()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }
}
