//! User persistence.
//!
//! The store is a seam: handlers and the auth service only see the
//! `UserRepository` trait. Production uses the SQLx/Postgres
//! implementation; tests substitute an in-memory one.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::errors::AuthError;
use crate::auth::user::{Email, User, UserRole};

/// User store seam.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, AuthError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError>;

    /// Insert a new user. A duplicate email is `EmailAlreadyExists`.
    async fn insert(&self, user: &User) -> Result<(), AuthError>;
}

/// SQLx/Postgres implementation of the user store.
pub struct SqlxUserRepository {
    pool: Arc<PgPool>,
}

impl SqlxUserRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, AuthError> {
        Ok(User {
            id: self.id,
            email: Email::new(self.email)?,
            password_hash: self.password_hash,
            role: UserRole::from_str(&self.role)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn storage_error(context: &str, error: sqlx::Error) -> AuthError {
    tracing::error!(error = %error, "Database error: {context}");
    AuthError::Storage {
        message: format!("{context}: {error}"),
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    #[tracing::instrument(skip(self), fields(email = %email))]
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, role, created_at, updated_at \
             FROM users WHERE email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| storage_error("finding user by email", e))?;

        row.map(UserRow::into_user).transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, role, created_at, updated_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| storage_error("finding user by id", e))?;

        row.map(UserRow::into_user).transpose()
    }

    #[tracing::instrument(skip(self, user), fields(email = %user.email))]
    async fn insert(&self, user: &User) -> Result<(), AuthError> {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, role, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user.id)
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| {
            // The unique index on email is the authority on duplicates;
            // the pre-insert lookup in the service is only a fast path.
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                AuthError::EmailAlreadyExists {
                    email: user.email.as_str().to_string(),
                }
            } else {
                storage_error("inserting user", e)
            }
        })?;

        Ok(())
    }
}
