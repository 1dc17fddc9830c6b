//! Error responses.
//!
//! Every error leaving this service has the same JSON shape, whether it
//! comes from the gate or from a handler:
//! `{ "error": "<status class>", "message": "<what happened>" }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;

/// JSON body of a terminal error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(error: &str, message: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
        }
    }
}

/// Handler-side error type. Wraps domain errors and maps them centrally.
#[derive(Debug)]
pub enum ApiError {
    Auth(AuthError),
    Internal(String),
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        ApiError::Auth(error)
    }
}

impl From<axum::http::header::InvalidHeaderValue> for ApiError {
    fn from(error: axum::http::header::InvalidHeaderValue) -> Self {
        ApiError::Internal(format!("invalid header value: {error}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            ApiError::Auth(AuthError::InvalidCredentials) => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                "invalid email or password".to_string(),
            ),
            ApiError::Auth(AuthError::InvalidToken | AuthError::TokenExpired) => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                "authentication required".to_string(),
            ),
            ApiError::Auth(AuthError::EmailAlreadyExists { .. }) => (
                StatusCode::CONFLICT,
                "Conflict",
                "email is already registered".to_string(),
            ),
            ApiError::Auth(AuthError::InvalidEmail { reason }) => (
                StatusCode::BAD_REQUEST,
                "Bad Request",
                format!("invalid email address: {reason}"),
            ),
            ApiError::Auth(AuthError::WeakPassword { reason }) => (
                StatusCode::BAD_REQUEST,
                "Bad Request",
                format!("password rejected: {reason}"),
            ),
            ApiError::Auth(AuthError::UserNotFound) => (
                StatusCode::NOT_FOUND,
                "Not Found",
                "user not found".to_string(),
            ),
            ApiError::Auth(AuthError::Hashing | AuthError::Storage { .. })
            | ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                // Concrete cause stays in the log, not in the body.
                "an internal error occurred".to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(error = ?self, http_status = %status, "Request failed");
        } else {
            tracing::debug!(error = ?self, http_status = %status, "Request rejected");
        }

        (status, Json(ErrorBody::new(error, &message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> ErrorBody {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn storage_errors_are_sanitized() {
        let response = ApiError::Auth(AuthError::Storage {
            message: "connection refused to db.internal:5432".to_string(),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(response).await;
        assert!(!body.message.contains("db.internal"));
    }

    #[tokio::test]
    async fn credential_failures_map_to_401() {
        let response = ApiError::Auth(AuthError::InvalidCredentials).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = ApiError::Auth(AuthError::TokenExpired).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn duplicate_email_maps_to_409() {
        let response = ApiError::Auth(AuthError::EmailAlreadyExists {
            email: "a@b.example".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
