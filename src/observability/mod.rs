//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! identity + admission middleware produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID is a field on every pipeline log event
//! - Metrics are cheap when no recorder is installed

pub mod logging;
pub mod metrics;
