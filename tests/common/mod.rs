//! Shared utilities for integration testing.

// Each test binary uses its own subset of these helpers.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response, Router};
use serde_json::Value;
use uuid::Uuid;

use auth_gateway::auth::{
    AuthError, AuthService, Email, PasswordHasher, TokenSigner, User, UserRepository, UserRole,
};
use auth_gateway::config::GatewayConfig;
use auth_gateway::gate::{
    ClassifierError, PolicyClassifier, PolicyDecision, RequestFacts,
};
use auth_gateway::HttpServer;

pub const TEST_JWT_SECRET: &str = "integration-test-secret-32-bytes-min!";

/// In-memory user store standing in for Postgres.
#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserRepository {
    /// Seed a user directly, bypassing the sign-up flow.
    pub fn seed(&self, user: User) {
        self.users.write().unwrap().insert(user.id, user);
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, AuthError> {
        Ok(self
            .users
            .read()
            .unwrap()
            .values()
            .find(|u| u.email == *email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        Ok(self.users.read().unwrap().get(&id).cloned())
    }

    async fn insert(&self, user: &User) -> Result<(), AuthError> {
        let mut users = self.users.write().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(AuthError::EmailAlreadyExists {
                email: user.email.as_str().to_string(),
            });
        }
        users.insert(user.id, user.clone());
        Ok(())
    }
}

/// Classifier that records the facts it was asked about and always allows.
#[derive(Default)]
pub struct RecordingClassifier {
    pub seen: Mutex<Vec<RequestFacts>>,
}

#[async_trait]
impl PolicyClassifier for RecordingClassifier {
    async fn evaluate(&self, facts: &RequestFacts) -> Result<PolicyDecision, ClassifierError> {
        self.seen.lock().unwrap().push(facts.clone());
        Ok(PolicyDecision::Allow)
    }
}

/// Classifier that always fails, as an unreachable decision service would.
pub struct FailingClassifier;

#[async_trait]
impl PolicyClassifier for FailingClassifier {
    async fn evaluate(&self, _facts: &RequestFacts) -> Result<PolicyDecision, ClassifierError> {
        Err(ClassifierError::Transport("connection refused".to_string()))
    }
}

/// Config tuned for tests: known secret, cookie without Secure so local
/// assertions stay simple.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.auth.jwt_secret = TEST_JWT_SECRET.to_string();
    config.auth.cookie.secure = false;
    config
}

/// A fully wired application over the in-memory store.
pub struct TestApp {
    pub router: Router,
    pub users: Arc<MemoryUserRepository>,
    pub config: GatewayConfig,
}

impl TestApp {
    pub fn new(config: GatewayConfig, classifier: Arc<dyn PolicyClassifier>) -> Self {
        let users = Arc::new(MemoryUserRepository::default());
        let auth = Arc::new(AuthService::new(
            users.clone(),
            // Light Argon2 parameters keep the suite fast.
            PasswordHasher::with_params(4096, 1, 1),
            TokenSigner::new(&config.auth.jwt_secret, config.auth.token_ttl_hours),
        ));

        let router = HttpServer::new(config.clone(), auth, classifier).into_router();
        Self {
            router,
            users,
            config,
        }
    }

    /// Seed a user with a known role and mint a valid token for them.
    pub fn seed_user_with_token(&self, email: &str, role: UserRole) -> (User, String) {
        let user = User::new(
            Email::new(email).unwrap(),
            "$argon2id$unused-for-token-tests".to_string(),
            role,
        );
        self.users.seed(user.clone());

        let signer = TokenSigner::new(
            &self.config.auth.jwt_secret,
            self.config.auth.token_ttl_hours,
        );
        let token = signer.issue(&user).unwrap();
        (user, token)
    }
}

/// Build a request carrying a synthetic peer address, as the real listener
/// would attach via `ConnectInfo`.
pub fn request(method: &str, path: &str, peer: [u8; 4]) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(path);
    builder.extension(axum::extract::ConnectInfo(SocketAddr::from((peer, 4711))))
}

/// Finish a builder with a JSON body.
pub fn with_json(builder: axum::http::request::Builder, body: Value) -> Request<Body> {
    builder
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Finish a builder with no body.
pub fn empty(builder: axum::http::request::Builder) -> Request<Body> {
    builder.body(Body::empty()).unwrap()
}

/// Collect a response body as JSON.
pub async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}
