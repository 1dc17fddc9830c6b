//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding the database URL.
pub const ENV_DATABASE_URL: &str = "AUTH_GATEWAY__DATABASE_URL";
/// Environment variable overriding the JWT signing secret.
pub const ENV_JWT_SECRET: &str = "AUTH_GATEWAY__JWT_SECRET";
/// Environment variable overriding the remote classifier credential.
pub const ENV_GATE_API_KEY: &str = "AUTH_GATEWAY__GATE_API_KEY";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
///
/// When `path` is `None` the built-in defaults are used. Secret-bearing
/// fields are overridable from the environment either way, so a deployment
/// can run without a config file at all.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides for secret-bearing fields.
fn apply_env_overrides(config: &mut GatewayConfig) {
    if let Ok(url) = std::env::var(ENV_DATABASE_URL) {
        if !url.trim().is_empty() {
            config.database.url = url;
        }
    }
    if let Ok(secret) = std::env::var(ENV_JWT_SECRET) {
        if !secret.trim().is_empty() {
            config.auth.jwt_secret = secret;
        }
    }
    if let Ok(key) = std::env::var(ENV_GATE_API_KEY) {
        if !key.trim().is_empty() {
            config.gate.remote.api_key = key;
        }
    }
}
