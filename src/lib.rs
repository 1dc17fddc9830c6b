//! User-acquisition API gateway.
//!
//! A small REST API for account sign-up, sign-in and sign-out, fronted by a
//! request gate that checks every inbound request against bot, shield and
//! rate-limit policy before it reaches route dispatch.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌─────────────────────────────────────────────────┐
//!                   │                  AUTH GATEWAY                    │
//!                   │                                                  │
//!  Client Request   │  trace → timeout → body limit → headers          │
//!  ─────────────────┼─▶ identity ──▶ gate ──▶ router ──▶ handlers      │
//!                   │       │         │                     │          │
//!                   │       │         ▼                     ▼          │
//!                   │       │  policy classifier      auth service     │
//!                   │       │  (local engine or       (argon2, jwt,    │
//!                   │       │   remote decision        user store)     │
//!                   │       │   service)                               │
//!                   │       │                                          │
//!                   │  ┌───────────────────────────────────────────┐  │
//!                   │  │          Cross-Cutting Concerns            │  │
//!                   │  │  ┌────────┐ ┌─────────────┐ ┌───────────┐ │  │
//!                   │  │  │ config │ │observability│ │ lifecycle │ │  │
//!                   │  │  └────────┘ └─────────────┘ └───────────┘ │  │
//!                   │  └───────────────────────────────────────────┘  │
//!                   └─────────────────────────────────────────────────┘
//! ```
//!
//! The gate forwards a request unchanged or terminates it with a JSON error
//! body; exactly one of the two happens for every request.

// Core subsystems
pub mod config;
pub mod http;

// Request gating
pub mod gate;

// Accounts & identity
pub mod auth;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
