//! The request gate.
//!
//! Runs once per request, after identity resolution and before route
//! dispatch. Resolves the caller role, asks the classifier for a decision,
//! and maps that decision to exactly one outcome: forward the request
//! unchanged, or answer with a terminal JSON response. The mapping is a
//! single `match`; there is no path on which both (or neither) happen.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};

use crate::auth::AuthContext;
use crate::config::{GateConfig, TierTable};
use crate::gate::classifier::{PolicyClassifier, RequestFacts};
use crate::gate::decision::{CallerRole, DenyReason, PolicyDecision};
use crate::http::response::ErrorBody;
use crate::observability::metrics;

/// State for the gate middleware. Built once at startup from validated
/// config; shared immutably across requests.
#[derive(Clone)]
pub struct GateState {
    classifier: Arc<dyn PolicyClassifier>,
    enabled: bool,
    tiers: TierTable,
    exempt_paths: Vec<String>,
    trusted_proxies: Vec<IpAddr>,
}

impl GateState {
    pub fn new(classifier: Arc<dyn PolicyClassifier>, config: &GateConfig) -> Self {
        Self {
            classifier,
            enabled: config.enabled,
            tiers: config.tiers.clone(),
            exempt_paths: config.exempt_paths.clone(),
            // Unparsable entries were rejected by config validation.
            trusted_proxies: config
                .trusted_proxies
                .iter()
                .filter_map(|addr| addr.parse().ok())
                .collect(),
        }
    }

    fn is_exempt(&self, path: &str) -> bool {
        self.exempt_paths.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }
}

/// Gate every inbound request through bot/shield/rate-limit policy.
pub async fn gate_middleware(
    State(state): State<GateState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.enabled || state.is_exempt(request.uri().path()) {
        return next.run(request).await;
    }

    // Step 1: role resolution. No identity means guest.
    let identity = request.extensions().get::<AuthContext>();
    let role = identity.map_or(CallerRole::Guest, |ctx| ctx.role.as_caller_role());

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let client_ip = resolve_client_ip(request.headers(), peer, &state.trusted_proxies);

    let caller = match identity {
        Some(ctx) => ctx.user_id.to_string(),
        None => client_ip
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    };

    let facts = RequestFacts {
        caller,
        role,
        tier: state.tiers.tier_for(role),
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        query: request.uri().query().map(str::to_string),
        client_ip,
        user_agent: request
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    // Step 2: obtain the decision. A classifier failure is not a decision;
    // it fails closed below.
    let decision = state.classifier.evaluate(&facts).await;

    // Steps 3 and 4: map the decision exactly once. Every arm either
    // forwards or terminates; returning here makes the outcome absorbing.
    match decision {
        Ok(PolicyDecision::Allow) => next.run(request).await,
        Ok(PolicyDecision::Deny(reason)) => {
            tracing::warn!(
                caller = %facts.caller,
                role = %facts.role,
                path = %facts.path,
                reason = %reason,
                "Request denied by policy"
            );
            metrics::record_gate_denied(reason.as_str());
            deny_response(reason)
        }
        Err(error) => {
            tracing::error!(
                caller = %facts.caller,
                role = %facts.role,
                path = %facts.path,
                error = %error,
                "Policy classifier failure, failing closed"
            );
            metrics::record_classifier_failure();
            terminal(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                "security middleware failure",
            )
        }
    }
}

fn deny_response(reason: DenyReason) -> Response {
    match reason {
        DenyReason::Bot => terminal(
            StatusCode::FORBIDDEN,
            "Forbidden",
            "automated requests are not allowed",
        ),
        DenyReason::Shield => terminal(
            StatusCode::FORBIDDEN,
            "Forbidden",
            "request blocked by security policy",
        ),
        DenyReason::RateLimit => terminal(
            StatusCode::TOO_MANY_REQUESTS,
            "Too Many Requests",
            "rate limit exceeded",
        ),
        DenyReason::Other => terminal(StatusCode::FORBIDDEN, "Forbidden", "request denied"),
    }
}

fn terminal(status: StatusCode, error: &str, message: &str) -> Response {
    (status, Json(ErrorBody::new(error, message))).into_response()
}

/// Resolve the client address.
///
/// Precedence: the socket peer address wins unless the peer is a configured
/// trusted proxy, in which case the rightmost `X-Forwarded-For` entry that
/// is not itself a trusted proxy is used. Forwarding headers from untrusted
/// peers are attacker-controllable and are ignored.
fn resolve_client_ip(
    headers: &HeaderMap,
    peer: Option<IpAddr>,
    trusted_proxies: &[IpAddr],
) -> Option<IpAddr> {
    let peer_ip = peer?;
    if !trusted_proxies.contains(&peer_ip) {
        return Some(peer_ip);
    }

    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())?;

    forwarded
        .rsplit(',')
        .filter_map(|entry| entry.trim().parse::<IpAddr>().ok())
        .find(|ip| !trusted_proxies.contains(ip))
        .or(Some(peer_ip))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use axum::{middleware, routing::get, Router};
    use tower::ServiceExt;

    use crate::gate::classifier::ClassifierError;

    /// Classifier that always answers with a fixed result.
    enum Scripted {
        Allow,
        Deny(DenyReason),
        Fail,
    }

    #[async_trait]
    impl PolicyClassifier for Scripted {
        async fn evaluate(
            &self,
            _facts: &RequestFacts,
        ) -> Result<PolicyDecision, ClassifierError> {
            match self {
                Scripted::Allow => Ok(PolicyDecision::Allow),
                Scripted::Deny(reason) => Ok(PolicyDecision::Deny(*reason)),
                Scripted::Fail => {
                    Err(ClassifierError::Transport("connection refused".to_string()))
                }
            }
        }
    }

    fn scripted_allow() -> Arc<dyn PolicyClassifier> {
        Arc::new(Scripted::Allow)
    }

    fn scripted_deny(reason: DenyReason) -> Arc<dyn PolicyClassifier> {
        Arc::new(Scripted::Deny(reason))
    }

    fn scripted_failure() -> Arc<dyn PolicyClassifier> {
        Arc::new(Scripted::Fail)
    }

    fn app(classifier: Arc<dyn PolicyClassifier>, reached: Arc<AtomicBool>) -> Router {
        let state = GateState::new(classifier, &GateConfig::default());
        Router::new()
            .route(
                "/api/v1/users/me",
                get(move || {
                    let reached = reached.clone();
                    async move {
                        reached.store(true, Ordering::SeqCst);
                        "inner"
                    }
                }),
            )
            .route("/health", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(state, gate_middleware))
    }

    fn request(path: &str) -> Request<Body> {
        let mut request = Request::builder().uri(path).body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([203, 0, 113, 9], 4711))));
        request
    }

    async fn body_of(response: Response) -> ErrorBody {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn allowed_request_is_forwarded_and_gate_stays_silent() {
        let reached = Arc::new(AtomicBool::new(false));
        let app = app(scripted_allow(), reached.clone());

        let response = app.oneshot(request("/api/v1/users/me")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(reached.load(Ordering::SeqCst), "inner handler must run");
    }

    #[tokio::test]
    async fn bot_denial_terminates_with_403_and_never_forwards() {
        let reached = Arc::new(AtomicBool::new(false));
        let app = app(scripted_deny(DenyReason::Bot), reached.clone());

        let response = app.oneshot(request("/api/v1/users/me")).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_of(response).await;
        assert_eq!(body.error, "Forbidden");
        assert_eq!(body.message, "automated requests are not allowed");
        assert!(!reached.load(Ordering::SeqCst), "request must not be forwarded");
    }

    #[tokio::test]
    async fn shield_denial_terminates_with_403() {
        let reached = Arc::new(AtomicBool::new(false));
        let app = app(scripted_deny(DenyReason::Shield), reached.clone());

        let response = app.oneshot(request("/api/v1/users/me")).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_of(response).await;
        assert_eq!(body.message, "request blocked by security policy");
        assert!(!reached.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn rate_limit_denial_terminates_with_429() {
        let reached = Arc::new(AtomicBool::new(false));
        let app = app(scripted_deny(DenyReason::RateLimit), reached.clone());

        let response = app.oneshot(request("/api/v1/users/me")).await.unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = body_of(response).await;
        assert_eq!(body.error, "Too Many Requests");
        assert!(!reached.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn unmodeled_denial_reason_still_terminates_with_403() {
        let reached = Arc::new(AtomicBool::new(false));
        let app = app(scripted_deny(DenyReason::Other), reached.clone());

        let response = app.oneshot(request("/api/v1/users/me")).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(!reached.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn classifier_failure_fails_closed_with_500() {
        let reached = Arc::new(AtomicBool::new(false));
        let app = app(scripted_failure(), reached.clone());

        let response = app.oneshot(request("/api/v1/users/me")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(response).await;
        assert_eq!(body.message, "security middleware failure");
        assert!(!reached.load(Ordering::SeqCst), "failure must not bypass the gate");
    }

    #[tokio::test]
    async fn exempt_path_bypasses_even_a_failing_classifier() {
        let reached = Arc::new(AtomicBool::new(false));
        let app = app(scripted_failure(), reached);

        let response = app.oneshot(request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn disabled_gate_forwards_everything() {
        let mut config = GateConfig::default();
        config.enabled = false;
        let state = GateState::new(scripted_failure(), &config);
        let app = Router::new()
            .route("/api/v1/users/me", get(|| async { "inner" }))
            .layer(middleware::from_fn_with_state(state, gate_middleware));

        let response = app.oneshot(request("/api/v1/users/me")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn peer_address_wins_when_peer_is_untrusted() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "198.51.100.7".parse().unwrap());

        let peer = "203.0.113.9".parse().ok();
        let resolved = resolve_client_ip(&headers, peer, &[]);
        assert_eq!(resolved, "203.0.113.9".parse().ok());
    }

    #[test]
    fn forwarded_header_used_behind_trusted_proxy() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "198.51.100.7, 10.0.0.1".parse().unwrap(),
        );

        let trusted: Vec<IpAddr> = vec!["10.0.0.1".parse().unwrap()];
        let resolved = resolve_client_ip(&headers, "10.0.0.1".parse().ok(), &trusted);
        assert_eq!(resolved, "198.51.100.7".parse().ok());
    }

    #[test]
    fn all_forwarded_entries_trusted_falls_back_to_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.0.0.1".parse().unwrap());

        let trusted: Vec<IpAddr> = vec!["10.0.0.1".parse().unwrap()];
        let resolved = resolve_client_ip(&headers, "10.0.0.1".parse().ok(), &trusted);
        assert_eq!(resolved, "10.0.0.1".parse().ok());
    }
}
