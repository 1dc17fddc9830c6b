//! HTTP client for an external decision service.
//!
//! The service is a black box: it receives the caller, role, requested tier
//! and request facts, and answers allow/deny. Anything other than a
//! well-formed decision — transport error, non-2xx status, undecodable
//! body — is a [`ClassifierError`], which the gate maps to a terminal 500.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::RemoteClassifierConfig;
use crate::gate::classifier::{ClassifierError, PolicyClassifier, RequestFacts};
use crate::gate::decision::{DenyReason, PolicyDecision};

/// Wire request for one decision.
#[derive(Debug, Serialize)]
struct DecisionRequest<'a> {
    caller: &'a str,
    role: &'a str,
    max_requests: u32,
    window_secs: u64,
    method: &'a str,
    path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_agent: Option<&'a str>,
}

/// Wire response from the decision service.
#[derive(Debug, Deserialize)]
struct DecisionResponse {
    decision: String,
    #[serde(default)]
    reason: Option<String>,
}

/// [`PolicyClassifier`] backed by an external decision service.
pub struct RemoteClassifier {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl RemoteClassifier {
    /// Build the client. The per-request timeout is fixed here; the gate
    /// never retries, so a hung service costs at most one timeout.
    pub fn from_config(config: &RemoteClassifierConfig) -> Result<Self, ClassifierError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn map_response(response: DecisionResponse) -> Result<PolicyDecision, ClassifierError> {
        match response.decision.as_str() {
            "allow" => Ok(PolicyDecision::Allow),
            "deny" => {
                let reason = match response.reason.as_deref() {
                    Some("bot") => DenyReason::Bot,
                    Some("shield") => DenyReason::Shield,
                    Some("rate_limit") => DenyReason::RateLimit,
                    _ => DenyReason::Other,
                };
                Ok(PolicyDecision::Deny(reason))
            }
            other => Err(ClassifierError::Decode(format!(
                "unknown decision: {other}"
            ))),
        }
    }
}

#[async_trait]
impl PolicyClassifier for RemoteClassifier {
    async fn evaluate(&self, facts: &RequestFacts) -> Result<PolicyDecision, ClassifierError> {
        let body = DecisionRequest {
            caller: &facts.caller,
            role: facts.role.as_str(),
            max_requests: facts.tier.max_requests,
            window_secs: facts.tier.window_secs,
            method: &facts.method,
            path: &facts.path,
            query: facts.query.as_deref(),
            ip: facts.client_ip.map(|ip| ip.to_string()),
            user_agent: facts.user_agent.as_deref(),
        };

        let mut request = self.http.post(&self.endpoint).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifierError::Status(status.as_u16()));
        }

        let decoded: DecisionResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Decode(e.to_string()))?;

        Self::map_response(decoded)
    }
}
