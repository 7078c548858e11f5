//! Identity token verification and signing (HS256 JWT).

use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::principal::{Principal, Role};

/// Claims embedded in an identity token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject identifier.
    pub sub: i64,
    pub email: String,
    pub role: Role,
    /// Issued-at, seconds since epoch.
    #[serde(default)]
    pub iat: u64,
    /// Expiry, seconds since epoch.
    pub exp: u64,
}

impl Claims {
    /// Claims for `principal` valid for `ttl` from now.
    pub fn for_principal(principal: &Principal, ttl: Duration) -> Self {
        let now = jsonwebtoken::get_current_timestamp();
        Self {
            sub: principal.subject_id,
            email: principal.email.clone(),
            role: principal.role,
            iat: now,
            exp: now.saturating_add(ttl.as_secs()),
        }
    }

    pub fn into_principal(self) -> Principal {
        Principal {
            subject_id: self.sub,
            email: self.email,
            role: self.role,
        }
    }
}

/// Why a token could not be verified.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token signature does not match")]
    InvalidSignature,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed(e.to_string()),
        }
    }
}

/// Verifies tokens against the process-configured secret.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str, leeway_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = leeway_secs;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Check signature and expiry, returning the embedded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(data.claims)
    }
}

/// Signs tokens with the same secret the verifier uses.
///
/// Credential issuance belongs to the auth service; this exists for tooling
/// and tests that need well-formed tokens.
#[derive(Clone)]
pub struct TokenSigner {
    key: EncodingKey,
}

impl TokenSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn issue(&self, principal: &Principal, ttl: Duration) -> Result<String, TokenError> {
        self.sign(&Claims::for_principal(principal, ttl))
    }
}
