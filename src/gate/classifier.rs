//! The policy classifier seam.
//!
//! The gate itself is only control flow; the actual verdict comes from a
//! `PolicyClassifier`. Implementations: [`crate::gate::LocalPolicyEngine`]
//! (in-process) and [`crate::gate::RemoteClassifier`] (HTTP decision
//! service). Anything that can answer `evaluate` can sit behind the gate.

use std::net::IpAddr;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Tier;
use crate::gate::decision::{CallerRole, PolicyDecision};

/// Everything a classifier may consider for one request.
#[derive(Debug, Clone)]
pub struct RequestFacts {
    /// Stable caller identifier: user id when authenticated, client IP
    /// otherwise. Rate-limit buckets are keyed by this.
    pub caller: String,
    /// Resolved caller role.
    pub role: CallerRole,
    /// Rate-limit tier requested for this caller.
    pub tier: Tier,
    /// Request method.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Raw query string, when present.
    pub query: Option<String>,
    /// Resolved client address, when one could be determined.
    pub client_ip: Option<IpAddr>,
    /// User-agent header, when present.
    pub user_agent: Option<String>,
}

/// Failure to obtain a decision. Not a decision: the gate maps this to a
/// terminal 500 and never forwards.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("decision request failed: {0}")]
    Transport(String),

    #[error("decision service returned status {0}")]
    Status(u16),

    #[error("decision response undecodable: {0}")]
    Decode(String),
}

/// Capability interface for the policy engine behind the gate.
#[async_trait]
pub trait PolicyClassifier: Send + Sync {
    /// Evaluate one request. A returned error is a classifier failure, not
    /// a denial; callers must fail closed on it.
    async fn evaluate(&self, facts: &RequestFacts) -> Result<PolicyDecision, ClassifierError>;
}
