//! Correlation-aware tracing spans.
//!
//! Downstream work runs inside an `exchange` span carrying the correlation
//! id, so every event a handler emits through `tracing` can be joined with
//! the exchange's request and response records.

use tracing::Span;

/// Span wrapping one exchange's downstream processing.
pub fn exchange_span(correlation_id: &str, method: &str, path: &str) -> Span {
    tracing::info_span!(
        "exchange",
        correlation_id = %correlation_id,
        method = %method,
        path = %path,
    )
}
