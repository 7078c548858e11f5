//! Role → quota tier table.

use std::time::Duration;

use crate::config::{TierConfig, TiersConfig};
use crate::identity::Role;

/// A named sliding-window quota.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tier {
    /// Rule key sent to the decision provider.
    pub name: &'static str,
    pub window: Duration,
    pub max_requests: u32,
}

impl Tier {
    fn new(name: &'static str, config: &TierConfig) -> Self {
        Self {
            name,
            window: Duration::from_secs(config.window_secs),
            max_requests: config.max_requests,
        }
    }
}

/// Lookup table from role to tier. Roles without an entry get the fallback.
#[derive(Debug, Clone)]
pub struct TierTable {
    entries: Vec<(Role, Tier)>,
    fallback: Tier,
}

impl TierTable {
    pub fn from_config(config: &TiersConfig) -> Self {
        Self {
            entries: vec![
                (Role::Admin, Tier::new("admin", &config.admin)),
                (Role::User, Tier::new("user", &config.user)),
            ],
            fallback: Tier::new("guest", &config.guest),
        }
    }

    pub fn lookup(&self, role: Role) -> &Tier {
        self.entries
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, tier)| tier)
            .unwrap_or(&self.fallback)
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self::from_config(&TiersConfig::default())
    }
}
