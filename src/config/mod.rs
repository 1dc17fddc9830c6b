//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, env overrides for secrets)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Secrets (database URL, JWT secret, classifier credential) can be
//!   supplied via environment variables instead of the file

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::GatewayConfig;
pub use schema::{AuthConfig, CookieConfig, DatabaseConfig, LogFormat, ServerConfig};
pub use schema::{
    GateConfig, GateMode, ObservabilityConfig, RemoteClassifierConfig, Tier, TierTable,
};
