//! Request-scoped identity types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role carried by an identity token.
///
/// Unknown role strings deserialize as [`Role::Guest`], so a token can never
/// name a role the admission tiers do not cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    #[serde(other)]
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Guest => "guest",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated caller, built fresh from verified claims for each request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub subject_id: i64,
    pub email: String,
    pub role: Role,
}

/// Outcome of identity resolution, attached to every request that passes the
/// resolver.
///
/// A missing credential and an unverifiable one both end up as `Anonymous`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    Authenticated(Principal),
}

impl Identity {
    /// Role used for tiering and route guards. Anonymous callers are guests.
    pub fn role(&self) -> Role {
        match self {
            Identity::Anonymous => Role::Guest,
            Identity::Authenticated(principal) => principal.role,
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated(principal) => Some(principal),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated(_))
    }
}
