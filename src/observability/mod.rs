//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Observers (http/request.rs, http/response.rs) build:
//!     → record.rs (LogRecord: envelope + request/response detail)
//!     → emitter.rs (render JSON, absorb failures)
//!     → sink.rs (stdout, stderr, file, tracing, memory)
//!
//! Alongside:
//!     → logging.rs (process diagnostics via tracing-subscriber)
//!     → metrics.rs (counters, histograms)
//!     → tracing.rs (exchange spans with correlation IDs)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Correlation ID flows through records and spans
//! - Logging never introduces a failure into the exchange

pub mod emitter;
pub mod logging;
pub mod metrics;
pub mod record;
pub mod sink;
pub mod tracing;

pub use emitter::LogEmitter;
pub use record::{Level, LogRecord, LogType, ProjectedHeaders, Properties};
pub use sink::{LogSink, MemorySink};
