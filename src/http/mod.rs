//! HTTP interception subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → request.rs (resolve correlation id, capture body, emit Request record)
//!     → response.rs (buffer downstream output, classify, emit Success/Error record)
//!     → application router
//!     ← response.rs (replay buffered bytes + correlation header)
//!     ← client
//! ```
//!
//! Supporting pieces: correlation.rs (id resolution), headers.rs (allow-list
//! projection), body.rs (non-destructive capture), server.rs (layer wiring).

pub mod body;
pub mod correlation;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use correlation::{CorrelationContext, CorrelationId};
pub use headers::HeaderProjector;
pub use request::{request_logging_middleware, RequestObserver};
pub use response::{response_logging_middleware, ResponseObserver};
pub use server::{BuildError, HttpServer};
