//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up the middleware chain: trace → timeout → body limit →
//!   security headers → identity → gate → router
//! - Bind server to listener, serve until shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::{identity_middleware, AuthService, IdentityState};
use crate::config::GatewayConfig;
use crate::gate::{gate_middleware, GateState, PolicyClassifier};
use crate::http::handlers;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub config: Arc<GatewayConfig>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and wiring.
    pub fn new(
        config: GatewayConfig,
        auth: Arc<AuthService>,
        classifier: Arc<dyn PolicyClassifier>,
    ) -> Self {
        let state = AppState {
            auth: auth.clone(),
            config: Arc::new(config.clone()),
        };
        let router = Self::build_router(&config, state, auth, classifier);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(
        config: &GatewayConfig,
        state: AppState,
        auth: Arc<AuthService>,
        classifier: Arc<dyn PolicyClassifier>,
    ) -> Router {
        let identity_state = IdentityState {
            auth,
            cookie_name: config.auth.cookie.name.clone(),
        };
        let gate_state = GateState::new(classifier, &config.gate);

        let mut router = Router::new()
            .route("/api/v1/auth/sign-up", post(handlers::sign_up))
            .route("/api/v1/auth/sign-in", post(handlers::sign_in))
            .route("/api/v1/auth/sign-out", post(handlers::sign_out))
            .route("/api/v1/users/me", get(handlers::me))
            .route("/health", get(handlers::health))
            .with_state(state)
            // Stages run top to bottom; the gate is the last stop before
            // route dispatch. Applied as individual layers (outermost last)
            // so the router normalizes body types between them; the request
            // still flows track_requests → trace → timeout → body limit →
            // security headers → identity → gate → router.
            .layer(middleware::from_fn_with_state(gate_state, gate_middleware))
            .layer(middleware::from_fn_with_state(
                identity_state,
                identity_middleware,
            ))
            .layer(middleware::from_fn(security_headers))
            .layer(RequestBodyLimitLayer::new(config.server.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.server.request_timeout_secs,
            )))
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(track_requests));

        if let Some(cors) = cors_layer(&config.server.cors_allowed_origins) {
            router = router.layer(cors);
        }

        router
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Consume the server, returning its router. Used by tests to drive
    /// the full middleware chain without a listener.
    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Record one counter/histogram sample per request.
async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();

    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}

/// Baseline security response headers.
async fn security_headers(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}

fn cors_layer(allowed_origins: &[String]) -> Option<CorsLayer> {
    if allowed_origins.is_empty() {
        return None;
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true),
    )
}
