//! In-process decision provider.
//!
//! Keeps a sliding-window log of admitted requests per `(rule_key, ip)` and
//! raises bot/shield signals from configured substring patterns. Useful for
//! single-instance deployments and tests; quota state is not shared between
//! processes.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::admission::decision::{ProviderVerdict, ReasonFlags};
use crate::admission::provider::{DecisionProvider, ProviderError, QuotaQuery, RequestContext};
use crate::config::AdmissionConfig;

/// Timestamps of admitted requests inside the current window.
struct WindowLog {
    window: Duration,
    hits: VecDeque<Instant>,
}

impl WindowLog {
    fn new(window: Duration) -> Self {
        Self {
            window,
            hits: VecDeque::new(),
        }
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.hits.front() {
            if now.duration_since(oldest) >= self.window {
                self.hits.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Sliding-window quota plus pattern-based bot and shield signals.
pub struct LocalDecisionProvider {
    windows: DashMap<String, WindowLog>,
    bot_patterns: Vec<String>,
    shield_patterns: Vec<String>,
}

impl LocalDecisionProvider {
    pub fn new(bot_patterns: Vec<String>, shield_patterns: Vec<String>) -> Self {
        Self {
            windows: DashMap::new(),
            bot_patterns: lowercase_all(bot_patterns),
            shield_patterns: lowercase_all(shield_patterns),
        }
    }

    pub fn from_config(config: &AdmissionConfig) -> Self {
        Self::new(
            config.bot.user_agent_patterns.clone(),
            config.shield.patterns.clone(),
        )
    }

    /// Quota only, no bot or shield patterns.
    pub fn quota_only() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    fn is_bot(&self, ctx: &RequestContext) -> bool {
        let Some(agent) = ctx.user_agent.as_deref() else {
            return false;
        };
        let agent = agent.to_ascii_lowercase();
        self.bot_patterns.iter().any(|p| agent.contains(p.as_str()))
    }

    fn is_shield(&self, ctx: &RequestContext) -> bool {
        if self.shield_patterns.is_empty() {
            return false;
        }
        let path = ctx.path.to_ascii_lowercase();
        let query = ctx
            .query
            .as_deref()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join("&")
                    .to_lowercase()
            })
            .unwrap_or_default();

        self.shield_patterns
            .iter()
            .any(|p| path.contains(p.as_str()) || query.contains(p.as_str()))
    }

    /// Returns true when the window is full. Records a hit only when `admit` is set
    /// and there is room.
    fn window_exhausted(&self, query: &QuotaQuery, ctx: &RequestContext, admit: bool) -> bool {
        let now = Instant::now();
        let key = format!("{}:{}", query.rule_key, ctx.ip);
        let mut log = self
            .windows
            .entry(key)
            .or_insert_with(|| WindowLog::new(query.window));
        log.window = query.window;
        log.prune(now);

        let exhausted = log.hits.len() >= query.max as usize;
        if admit && !exhausted {
            log.hits.push_back(now);
        }
        exhausted
    }

    fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows.retain(|_, log| {
            log.prune(now);
            !log.hits.is_empty()
        });
        before - self.windows.len()
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

#[async_trait]
impl DecisionProvider for LocalDecisionProvider {
    async fn decide(
        &self,
        query: &QuotaQuery,
        ctx: &RequestContext,
    ) -> Result<ProviderVerdict, ProviderError> {
        let is_bot = self.is_bot(ctx);
        let is_shield = self.is_shield(ctx);
        let is_rate_limit = self.window_exhausted(query, ctx, !is_bot && !is_shield);

        let flags = ReasonFlags {
            is_bot,
            is_shield,
            is_rate_limit,
        };
        if is_bot || is_shield || is_rate_limit {
            Ok(ProviderVerdict::deny(flags))
        } else {
            Ok(ProviderVerdict::allow())
        }
    }

    /// Drop logs with no hits left in their window.
    fn purge_expired(&self) -> usize {
        self.sweep()
    }
}

fn lowercase_all(patterns: Vec<String>) -> Vec<String> {
    patterns
        .into_iter()
        .map(|p| p.to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}
