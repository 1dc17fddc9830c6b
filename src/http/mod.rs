//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware chain)
//!     → [identity, then gate — see auth::identity and gate::middleware]
//!     → handlers.rs (sign-up / sign-in / sign-out / me / health)
//!     → response.rs (error mapping), cookie.rs (session cookie)
//!     → Send to client
//! ```

pub mod cookie;
pub mod handlers;
pub mod response;
pub mod server;

pub use response::{ApiError, ErrorBody};
pub use server::{AppState, HttpServer};
