//! Identity resolution middleware.
//!
//! Runs before the gate. Reads the bearer header (preferred) or the
//! session cookie, validates the token, and attaches an [`AuthContext`] to
//! the request. Never terminates a request: an invalid or absent token
//! simply attaches nothing, and the gate then treats the caller as a
//! guest. Endpoints that require authentication enforce it themselves.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::errors::AuthError;
use crate::auth::service::AuthService;
use crate::auth::user::UserRole;
use crate::http::response::ApiError;

/// Authenticated caller identity, attached to request extensions.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
}

/// Extractor for handlers that require an authenticated caller. The
/// identity middleware attaches the context; a request without one is
/// rejected with 401.
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(ApiError::Auth(AuthError::InvalidToken))
    }
}

/// State for the identity middleware.
#[derive(Clone)]
pub struct IdentityState {
    pub auth: Arc<AuthService>,
    pub cookie_name: String,
}

/// Resolve the caller identity, if any.
pub async fn identity_middleware(
    State(state): State<IdentityState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = extract_token(&request, &state.cookie_name) {
        match state.auth.authenticate(&token) {
            Ok(ctx) => {
                request.extensions_mut().insert(ctx);
            }
            Err(e) => {
                // Anonymous from here on; the gate will rate the caller as
                // a guest and protected handlers will answer 401.
                tracing::debug!(error = %e, "Presented token did not authenticate");
            }
        }
    }

    next.run(request).await
}

/// Bearer header first, session cookie second.
fn extract_token(request: &Request<Body>, cookie_name: &str) -> Option<String> {
    if let Some(bearer) = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        if !bearer.is_empty() {
            return Some(bearer.to_string());
        }
    }

    let cookies = request
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?;

    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == cookie_name && !value.is_empty()).then(|| value.to_string())
    })
}
