//! Request gate subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (post-identity):
//!     → middleware.rs (resolve role, pick tier, gather request facts)
//!     → classifier.rs (PolicyClassifier seam)
//!         → engine.rs (in-process: bot / shield / token bucket)
//!         → remote.rs (HTTP decision service)
//!     → decision mapped once:
//!         Allowed            → forward unchanged
//!         Denied(Bot)        → 403, terminal
//!         Denied(Shield)     → 403, terminal
//!         Denied(RateLimit)  → 429, terminal
//!         classifier failure → 500, terminal (fail closed)
//! ```
//!
//! # Design Decisions
//! - Exactly one terminal outcome per request; the middleware returns the
//!   terminal response or the downstream response, never both
//! - Fail closed: an unreachable classifier denies, it never bypasses
//! - The classifier is a seam; any engine can sit behind it

pub mod classifier;
pub mod decision;
pub mod engine;
pub mod middleware;
pub mod remote;

pub use classifier::{ClassifierError, PolicyClassifier, RequestFacts};
pub use decision::{CallerRole, DenyReason, PolicyDecision};
pub use engine::{spawn_bucket_janitor, LocalPolicyEngine};
pub use middleware::{gate_middleware, GateState};
pub use remote::RemoteClassifier;
