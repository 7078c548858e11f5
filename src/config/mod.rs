//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → handed to subsystems at bootstrap
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{default_config, load_config, parse_config, ConfigError};
pub use schema::{
    AdmissionConfig, AuthConfig, BotConfig, GatewayConfig, ListenerConfig, ObservabilityConfig,
    ProviderConfig, ProviderKind, ShieldConfig, TierConfig, TiersConfig, TimeoutConfig,
};
pub use validation::ValidationError;
