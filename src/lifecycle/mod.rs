//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() → every ShutdownSignal resolves → server drains → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → graceful shutdown
//! ```
//!
//! # Design Decisions
//! - In-flight exchanges finish (and log) before the server stops

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
