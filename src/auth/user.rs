//! User entity and its value objects.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::errors::AuthError;
use crate::gate::CallerRole;

/// Role stored on an account. `guest` is not a stored role; it is what the
/// gate resolves when no identity is attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }

    /// The gate-side role this account role maps to.
    pub fn as_caller_role(&self) -> CallerRole {
        match self {
            UserRole::Admin => CallerRole::Admin,
            UserRole::User => CallerRole::User,
        }
    }
}

impl FromStr for UserRole {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "user" => Ok(UserRole::User),
            _ => Err(AuthError::Storage {
                message: format!("unknown role: {s}"),
            }),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Email value object. Construction validates; an `Email` in hand is
/// trimmed, lowercased and shaped like an address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub fn new(email: impl Into<String>) -> Result<Self, AuthError> {
        let email = email.into().trim().to_lowercase();

        let invalid = |reason: &str| AuthError::InvalidEmail {
            reason: reason.to_string(),
        };

        if email.is_empty() {
            return Err(invalid("empty address"));
        }
        if email.len() > 255 {
            return Err(invalid("longer than 255 characters"));
        }

        let (local, domain) = email.split_once('@').ok_or_else(|| invalid("missing @"))?;
        if local.is_empty() {
            return Err(invalid("empty local part"));
        }
        if domain.is_empty() || !domain.contains('.') || domain.contains('@') {
            return Err(invalid("malformed domain"));
        }

        Ok(Email(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: Email,
    /// Argon2id hash in PHC string format. Never the raw password.
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: Email, password_hash: String, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            role,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
