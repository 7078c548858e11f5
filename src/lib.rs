//! Request admission gateway.
//!
//! Resolves an optional identity token into a request-scoped principal, maps
//! it to a quota tier, and asks a decision provider whether the request may
//! proceed.

pub mod admission;
pub mod config;
pub mod http;
pub mod identity;
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
