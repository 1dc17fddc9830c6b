//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::gate::CallerRole;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server settings (bind address, timeouts, limits).
    pub server: ServerConfig,

    /// Relational database settings.
    pub database: DatabaseConfig,

    /// Session token and cookie settings.
    pub auth: AuthConfig,

    /// Request gate policy settings.
    pub gate: GateConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Origins allowed for cross-origin requests. Empty disables CORS.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 1024 * 1024,
            cors_allowed_origins: Vec::new(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL. Overridable via `AUTH_GATEWAY__DATABASE_URL`.
    pub url: String,

    /// Maximum pool connections.
    pub max_connections: u32,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost:5432/auth_gateway".to_string(),
            max_connections: 10,
            connect_timeout_secs: 5,
        }
    }
}

/// Session token and cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Secret for signing session tokens (HMAC-SHA256). Must be at least
    /// 32 bytes. Overridable via `AUTH_GATEWAY__JWT_SECRET`.
    // WARNING: This is a placeholder! Change this in production.
    pub jwt_secret: String,

    /// Session token time-to-live in hours.
    pub token_ttl_hours: u64,

    /// Session cookie settings.
    pub cookie: CookieConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "CHANGE_ME_IN_PRODUCTION_0123456789abcdef".to_string(),
            token_ttl_hours: 24,
            cookie: CookieConfig::default(),
        }
    }
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Cookie name.
    pub name: String,

    /// Cookie path.
    pub path: String,

    /// Send only over HTTPS.
    pub secure: bool,

    /// SameSite attribute ("Strict", "Lax" or "None").
    pub same_site: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "session".to_string(),
            path: "/".to_string(),
            secure: true,
            same_site: "Strict".to_string(),
        }
    }
}

/// Which policy classifier backs the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GateMode {
    /// In-process policy engine (bot signatures, shield patterns, token
    /// buckets). The gateway runs self-contained.
    #[default]
    Local,
    /// External decision service reached over HTTP.
    Remote,
}

/// A rate-limit tier: at most `max_requests` per sliding `window_secs`.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Tier {
    pub max_requests: u32,
    pub window_secs: u64,
}

/// Role → tier mapping for rate limiting.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TierTable {
    pub admin: Tier,
    pub user: Tier,
    pub guest: Tier,
}

impl TierTable {
    /// Tier applied to a caller with the given role.
    pub fn tier_for(&self, role: CallerRole) -> Tier {
        match role {
            CallerRole::Admin => self.admin,
            CallerRole::User => self.user,
            CallerRole::Guest => self.guest,
        }
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            admin: Tier {
                max_requests: 20,
                window_secs: 60,
            },
            user: Tier {
                max_requests: 10,
                window_secs: 60,
            },
            guest: Tier {
                max_requests: 5,
                window_secs: 60,
            },
        }
    }
}

/// Request gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GateConfig {
    /// Enable the gate. When disabled every request passes through.
    pub enabled: bool,

    /// Classifier backing the gate.
    pub mode: GateMode,

    /// Role → rate-limit tier mapping.
    pub tiers: TierTable,

    /// Path prefixes that bypass the gate (health probes, metrics scrapes).
    pub exempt_paths: Vec<String>,

    /// Peer addresses whose forwarding headers are trusted. Forwarding
    /// headers from any other peer are ignored.
    pub trusted_proxies: Vec<String>,

    /// User-agent patterns classified as automated traffic.
    pub bot_signatures: Vec<String>,

    /// User-agent patterns exempt from bot classification.
    pub bot_allowlist: Vec<String>,

    /// Path/query patterns classified as attack probes.
    pub shield_patterns: Vec<String>,

    /// Remote decision service settings (used when `mode = "remote"`).
    pub remote: RemoteClassifierConfig,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: GateMode::default(),
            tiers: TierTable::default(),
            exempt_paths: vec!["/health".to_string(), "/metrics".to_string()],
            trusted_proxies: Vec::new(),
            bot_signatures: vec![
                "(?i)bot".to_string(),
                "(?i)crawler".to_string(),
                "(?i)spider".to_string(),
                "(?i)scrapy".to_string(),
                "(?i)curl/".to_string(),
                "(?i)wget/".to_string(),
                "(?i)python-requests".to_string(),
                "(?i)headless".to_string(),
            ],
            bot_allowlist: Vec::new(),
            shield_patterns: vec![
                r"\.\./".to_string(),
                "(?i)%2e%2e%2f".to_string(),
                r"(?i)union\s+select".to_string(),
                "(?i)<script".to_string(),
                "(?i)etc/passwd".to_string(),
            ],
            remote: RemoteClassifierConfig::default(),
        }
    }
}

/// Remote decision service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteClassifierConfig {
    /// Decision endpoint URL.
    pub endpoint: String,

    /// Bearer credential sent with each decision request. Overridable via
    /// `AUTH_GATEWAY__GATE_API_KEY`.
    pub api_key: String,

    /// Decision request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RemoteClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9100/v1/decide".to_string(),
            api_key: String::new(),
            timeout_secs: 2,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output for development.
    #[default]
    Pretty,
    /// JSON lines for log aggregation.
    Json,
}
