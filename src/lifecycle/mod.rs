//! Process lifecycle.
//!
//! # Responsibilities
//! - Translate OS signals into one internal shutdown event
//! - Let long-running tasks (HTTP server, bucket janitor) subscribe to it

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
