//! Policy decision types.

use std::fmt;

/// Role attributed to the caller of a request.
///
/// Resolved from the authenticated identity when one is attached; requests
/// without an identity are classified as `Guest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallerRole {
    Admin,
    User,
    Guest,
}

impl CallerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallerRole::Admin => "admin",
            CallerRole::User => "user",
            CallerRole::Guest => "guest",
        }
    }
}

impl fmt::Display for CallerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// User-agent matched an automated-traffic signature.
    Bot,
    /// Request matched an attack-pattern signature.
    Shield,
    /// Caller exhausted its rate-limit tier.
    RateLimit,
    /// Denied for a reason this gateway does not model.
    Other,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::Bot => "bot",
            DenyReason::Shield => "shield",
            DenyReason::RateLimit => "rate_limit",
            DenyReason::Other => "other",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict for a single request. Computed fresh per request, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Forward the request unchanged.
    Allow,
    /// Terminate the request with the mapped status.
    Deny(DenyReason),
}
