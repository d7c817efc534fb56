//! HTTP exchange logging library.
//!
//! Observes every request and response passing through an axum service and
//! writes one structured record per phase, tied together by a correlation id.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::LoggerConfig;
pub use http::{CorrelationId, HttpServer};
pub use lifecycle::Shutdown;
pub use observability::{LogEmitter, MemorySink};
