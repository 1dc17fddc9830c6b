//! Accounts & identity subsystem.
//!
//! # Data Flow
//! ```text
//! sign-up / sign-in request
//!     → service.rs (validate, hash / verify, persist, issue token)
//!         → password.rs (Argon2id on the blocking pool)
//!         → repository.rs (user store seam; SQLx/Postgres impl)
//!         → tokens.rs (JWT issue / verify)
//!
//! every request
//!     → identity.rs (bearer header or session cookie → AuthContext)
//! ```
//!
//! # Design Decisions
//! - Credential failures are indistinguishable to the caller: unknown
//!   email and wrong password both answer 401
//! - Session tokens are stateless; sign-out clears the cookie only
//! - The identity stage never rejects a request; it attaches a context or
//!   nothing, and handlers decide what anonymity means for them

pub mod errors;
pub mod identity;
pub mod password;
pub mod repository;
pub mod service;
pub mod tokens;
pub mod user;

pub use errors::AuthError;
pub use identity::{identity_middleware, AuthContext, IdentityState};
pub use password::PasswordHasher;
pub use repository::{SqlxUserRepository, UserRepository};
pub use service::AuthService;
pub use tokens::TokenSigner;
pub use user::{Email, User, UserRole};
