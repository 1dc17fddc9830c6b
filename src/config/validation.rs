//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, tiers non-zero)
//! - Check that signature patterns compile and addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use url::Url;

use crate::config::schema::{GateMode, GatewayConfig, Tier};

/// Minimum accepted JWT secret length in bytes.
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g., `gate.tiers.guest`).
    pub field: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every failure.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            "not a valid socket address",
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "server.request_timeout_secs",
            "must be greater than zero",
        ));
    }
    if config.server.max_body_bytes == 0 {
        errors.push(ValidationError::new(
            "server.max_body_bytes",
            "must be greater than zero",
        ));
    }

    if config.database.url.trim().is_empty() {
        errors.push(ValidationError::new("database.url", "must not be empty"));
    }
    if config.database.max_connections == 0 {
        errors.push(ValidationError::new(
            "database.max_connections",
            "must be greater than zero",
        ));
    }

    if config.auth.jwt_secret.len() < MIN_JWT_SECRET_LEN {
        errors.push(ValidationError::new(
            "auth.jwt_secret",
            format!("must be at least {} bytes", MIN_JWT_SECRET_LEN),
        ));
    }
    if config.auth.token_ttl_hours == 0 {
        errors.push(ValidationError::new(
            "auth.token_ttl_hours",
            "must be greater than zero",
        ));
    }
    match config.auth.cookie.same_site.as_str() {
        "Strict" | "Lax" | "None" => {}
        other => errors.push(ValidationError::new(
            "auth.cookie.same_site",
            format!("unknown SameSite value: {other}"),
        )),
    }

    validate_tier(&mut errors, "gate.tiers.admin", config.gate.tiers.admin);
    validate_tier(&mut errors, "gate.tiers.user", config.gate.tiers.user);
    validate_tier(&mut errors, "gate.tiers.guest", config.gate.tiers.guest);

    for (i, addr) in config.gate.trusted_proxies.iter().enumerate() {
        if addr.parse::<IpAddr>().is_err() {
            errors.push(ValidationError::new(
                "gate.trusted_proxies",
                format!("entry {i} is not a valid IP address: {addr}"),
            ));
        }
    }

    validate_patterns(&mut errors, "gate.bot_signatures", &config.gate.bot_signatures);
    validate_patterns(&mut errors, "gate.bot_allowlist", &config.gate.bot_allowlist);
    validate_patterns(&mut errors, "gate.shield_patterns", &config.gate.shield_patterns);

    if config.gate.mode == GateMode::Remote {
        if Url::parse(&config.gate.remote.endpoint).is_err() {
            errors.push(ValidationError::new(
                "gate.remote.endpoint",
                "not a valid URL",
            ));
        }
        if config.gate.remote.timeout_secs == 0 {
            errors.push(ValidationError::new(
                "gate.remote.timeout_secs",
                "must be greater than zero",
            ));
        }
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "not a valid socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_tier(errors: &mut Vec<ValidationError>, field: &str, tier: Tier) {
    if tier.max_requests == 0 {
        errors.push(ValidationError::new(field, "max_requests must be greater than zero"));
    }
    if tier.window_secs == 0 {
        errors.push(ValidationError::new(field, "window_secs must be greater than zero"));
    }
}

fn validate_patterns(errors: &mut Vec<ValidationError>, field: &str, patterns: &[String]) {
    for pattern in patterns {
        if let Err(e) = regex::Regex::new(pattern) {
            errors.push(ValidationError::new(
                field,
                format!("pattern does not compile: {e}"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::GatewayConfig;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors_not_just_first() {
        let mut config = GatewayConfig::default();
        config.server.bind_address = "nope".to_string();
        config.auth.jwt_secret = "short".to_string();
        config.gate.tiers.guest.max_requests = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 3, "expected 3+ errors, got {errors:?}");
    }

    #[test]
    fn rejects_uncompilable_signature_pattern() {
        let mut config = GatewayConfig::default();
        config.gate.bot_signatures.push("(unclosed".to_string());

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "gate.bot_signatures"));
    }

    #[test]
    fn remote_mode_requires_valid_endpoint() {
        let mut config = GatewayConfig::default();
        config.gate.mode = GateMode::Remote;
        config.gate.remote.endpoint = "not a url".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "gate.remote.endpoint"));
    }

    #[test]
    fn rejects_untrusted_proxy_entry() {
        let mut config = GatewayConfig::default();
        config.gate.trusted_proxies.push("10.0.0.999".to_string());

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "gate.trusted_proxies"));
    }
}
