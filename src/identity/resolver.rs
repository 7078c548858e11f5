//! Identity resolution middleware.
//!
//! Decodes an optional credential into an [`Identity`] and attaches it to the
//! request. This layer never rejects: authorization is left to the admission
//! controller and to per-route guards.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::config::AuthConfig;
use crate::http::request;
use crate::identity::principal::Identity;
use crate::identity::token::TokenVerifier;
use crate::observability::metrics;

/// Where a credential was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Cookie,
    BearerHeader,
}

impl CredentialSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialSource::Cookie => "cookie",
            CredentialSource::BearerHeader => "bearer",
        }
    }
}

/// Resolves request credentials into identities.
#[derive(Clone)]
pub struct IdentityResolver {
    verifier: TokenVerifier,
    cookie_name: String,
    trust_forwarded_for: bool,
}

impl IdentityResolver {
    pub fn new(verifier: TokenVerifier, cookie_name: impl Into<String>) -> Self {
        Self {
            verifier,
            cookie_name: cookie_name.into(),
            trust_forwarded_for: false,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            verifier: TokenVerifier::new(&config.jwt_secret, config.leeway_secs),
            cookie_name: config.cookie_name.clone(),
            trust_forwarded_for: config.trust_forwarded_for,
        }
    }

    /// Find a credential: the named cookie first, then `Authorization: Bearer`.
    pub fn extract_credential<'a>(&self, headers: &'a HeaderMap) -> Option<(&'a str, CredentialSource)> {
        if let Some(token) = cookie_value(headers, &self.cookie_name) {
            return Some((token, CredentialSource::Cookie));
        }
        bearer_token(headers).map(|token| (token, CredentialSource::BearerHeader))
    }

    /// Resolve the caller's identity. Total: failures become `Anonymous`.
    pub fn resolve<B>(&self, req: &Request<B>) -> Identity {
        let Some((token, source)) = self.extract_credential(req.headers()) else {
            metrics::record_identity("anonymous");
            return Identity::Anonymous;
        };

        match self.verifier.verify(token) {
            Ok(claims) => {
                metrics::record_identity("authenticated");
                Identity::Authenticated(claims.into_principal())
            }
            Err(e) => {
                tracing::warn!(
                    request_id = %request::request_id(req),
                    client_ip = %request::client_ip(req, self.trust_forwarded_for),
                    path = %req.uri().path(),
                    source = source.as_str(),
                    error = %e,
                    "Credential rejected, continuing as anonymous"
                );
                metrics::record_identity("invalid");
                Identity::Anonymous
            }
        }
    }
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware attaching the resolved [`Identity`] as a request extension.
pub async fn identity_middleware(
    State(resolver): State<Arc<IdentityResolver>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let identity = resolver.resolve(&req);
    req.extensions_mut().insert(identity);
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::identity::principal::{Principal, Role};
    use crate::identity::token::TokenSigner;

    const SECRET: &str = "resolver-test-secret";

    fn resolver() -> IdentityResolver {
        IdentityResolver::new(TokenVerifier::new(SECRET, 0), "token")
    }

    fn principal(role: Role) -> Principal {
        Principal {
            subject_id: 9,
            email: "someone@example.com".into(),
            role,
        }
    }

    fn token_for(role: Role) -> String {
        TokenSigner::new(SECRET)
            .issue(&principal(role), Duration::from_secs(300))
            .unwrap()
    }

    #[test]
    fn test_no_credential_is_anonymous() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(resolver().resolve(&req), Identity::Anonymous);
    }

    #[test]
    fn test_cookie_beats_header() {
        let user = token_for(Role::User);
        let admin = token_for(Role::Admin);
        let req = Request::builder()
            .uri("/")
            .header(header::COOKIE, format!("theme=dark; token={user}"))
            .header(header::AUTHORIZATION, format!("Bearer {admin}"))
            .body(Body::empty())
            .unwrap();

        let (found, source) = resolver().extract_credential(req.headers()).unwrap();
        assert_eq!(found, user);
        assert_eq!(source, CredentialSource::Cookie);
        assert_eq!(resolver().resolve(&req).role(), Role::User);
    }

    #[test]
    fn test_bearer_header() {
        let req = Request::builder()
            .uri("/")
            .header(header::AUTHORIZATION, format!("Bearer {}", token_for(Role::Admin)))
            .body(Body::empty())
            .unwrap();
        assert_eq!(
            resolver().resolve(&req),
            Identity::Authenticated(principal(Role::Admin))
        );
    }

    #[test]
    fn test_non_bearer_scheme_ignored() {
        let req = Request::builder()
            .uri("/")
            .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .header(header::COOKIE, "token=")
            .body(Body::empty())
            .unwrap();
        assert!(resolver().extract_credential(req.headers()).is_none());
    }

    #[test]
    fn test_tampered_token_is_anonymous() {
        let mut token = token_for(Role::Admin);
        token.push('x');
        let req = Request::builder()
            .uri("/")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        assert_eq!(resolver().resolve(&req), Identity::Anonymous);
    }

    #[test]
    fn test_resolution_is_repeatable() {
        let token = token_for(Role::User);
        let build = || {
            Request::builder()
                .uri("/")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap()
        };
        let first = resolver().resolve(&build());
        let second = resolver().resolve(&build());
        assert!(first.is_authenticated());
        assert_eq!(first, second);
    }
}
