//! Account operations: sign-up, sign-in, token authentication.

use std::sync::Arc;

use crate::auth::errors::AuthError;
use crate::auth::identity::AuthContext;
use crate::auth::password::{self, PasswordHasher};
use crate::auth::repository::UserRepository;
use crate::auth::tokens::TokenSigner;
use crate::auth::user::{Email, User, UserRole};

/// Application service for accounts and sessions.
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
    tokens: TokenSigner,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, hasher: PasswordHasher, tokens: TokenSigner) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    pub fn token_ttl_secs(&self) -> u64 {
        self.tokens.ttl_secs()
    }

    /// Create an account and issue its first session token.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        let email = Email::new(email)?;
        password::validate_strength(password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists {
                email: email.as_str().to_string(),
            });
        }

        let password_hash = self.hasher.hash(password.to_string()).await?;
        let user = User::new(email, password_hash, UserRole::User);
        self.users.insert(&user).await?;

        tracing::info!(user_id = %user.id, email = %user.email, "Account created");

        let token = self.tokens.issue(&user)?;
        Ok((user, token))
    }

    /// Verify credentials and issue a session token.
    ///
    /// Unknown email and wrong password are indistinguishable to the
    /// caller: both are `InvalidCredentials`.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        let email = Email::new(email).map_err(|_| AuthError::InvalidCredentials)?;

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let verified = self
            .hasher
            .verify(password.to_string(), user.password_hash.clone())
            .await
            .map_err(|_| AuthError::InvalidCredentials)?;

        if !verified {
            tracing::warn!(email = %user.email, "Sign-in rejected: bad password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user)?;
        Ok((user, token))
    }

    /// Authenticate a bearer token into a caller context.
    pub fn authenticate(&self, token: &str) -> Result<AuthContext, AuthError> {
        let claims = self.tokens.verify(token)?;
        let role = claims.role.parse().map_err(|_| AuthError::InvalidToken)?;

        Ok(AuthContext {
            user_id: claims.sub,
            email: claims.email,
            role,
        })
    }

    /// Look up the profile behind an authenticated context.
    pub async fn profile(&self, ctx: &AuthContext) -> Result<User, AuthError> {
        self.users
            .find_by_id(ctx.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}
