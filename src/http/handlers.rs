//! Route handlers.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::{AuthContext, User, UserRole};
use crate::http::cookie;
use crate::http::response::ApiError;
use crate::http::server::AppState;

/// Sign-up request body.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
}

/// Sign-in request body.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Public view of an account. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.as_str().to_string(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Body returned by sign-up and sign-in.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: UserResponse,
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

/// POST /api/v1/auth/sign-up
pub async fn sign_up(
    State(state): State<AppState>,
    Json(body): Json<SignUpRequest>,
) -> Result<Response, ApiError> {
    let (user, token) = state.auth.sign_up(&body.email, &body.password).await?;
    session_response(&state, StatusCode::CREATED, &user, token)
}

/// POST /api/v1/auth/sign-in
pub async fn sign_in(
    State(state): State<AppState>,
    Json(body): Json<SignInRequest>,
) -> Result<Response, ApiError> {
    let (user, token) = state.auth.sign_in(&body.email, &body.password).await?;
    session_response(&state, StatusCode::OK, &user, token)
}

/// POST /api/v1/auth/sign-out
///
/// Sessions are stateless; signing out clears the cookie and nothing else.
pub async fn sign_out(State(state): State<AppState>) -> Result<Response, ApiError> {
    let mut response =
        (StatusCode::OK, Json(json!({ "message": "signed out" }))).into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        cookie::clear_session_cookie(&state.config.auth.cookie)?,
    );
    Ok(response)
}

/// GET /api/v1/users/me
pub async fn me(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.auth.profile(&ctx).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

fn session_response(
    state: &AppState,
    status: StatusCode,
    user: &User,
    token: String,
) -> Result<Response, ApiError> {
    let ttl = state.auth.token_ttl_secs();
    let cookie = cookie::session_cookie(&state.config.auth.cookie, &token, ttl)?;

    let body = SessionResponse {
        user: UserResponse::from(user),
        token,
        token_type: "Bearer",
        expires_in: ttl,
    };

    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}
