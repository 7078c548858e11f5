//! Identity subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → resolver.rs (cookie `token`, else `Authorization: Bearer`)
//!     → token.rs (HS256 signature + expiry)
//!     → principal.rs (Identity::Authenticated | Identity::Anonymous)
//!     → request extensions → admission controller
//! ```
//!
//! # Design Decisions
//! - Never rejects: an unverifiable credential is logged and treated as absent
//! - Identity is built per request and never mutated afterwards

pub mod principal;
pub mod resolver;
pub mod token;

pub use principal::{Identity, Principal, Role};
pub use resolver::{identity_middleware, CredentialSource, IdentityResolver};
pub use token::{Claims, TokenError, TokenSigner, TokenVerifier};
