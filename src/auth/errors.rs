//! Account and session errors.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid token")]
    InvalidToken,

    #[error("token has expired")]
    TokenExpired,

    #[error("email already registered: {email}")]
    EmailAlreadyExists { email: String },

    #[error("invalid email address: {reason}")]
    InvalidEmail { reason: String },

    #[error("password rejected: {reason}")]
    WeakPassword { reason: String },

    #[error("user not found")]
    UserNotFound,

    #[error("password hashing failed")]
    Hashing,

    #[error("storage error: {message}")]
    Storage { message: String },
}
