//! Correlation identifier resolution and propagation.
//!
//! # Responsibilities
//! - Take the caller's correlation id from the configured header, or mint one
//! - Resolve once per exchange; later stages reuse the stored value
//! - Write the id onto the outgoing response headers
//!
//! # Design Decisions
//! - Caller-supplied ids are trusted verbatim for cross-service continuity
//! - The id lives in request extensions only; nothing is process-wide
//! - Values that cannot be echoed back as a header are replaced

use std::fmt;

use axum::extract::FromRequestParts;
use axum::http::header::InvalidHeaderName;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode};
use uuid::Uuid;

/// Opaque identifier tying one request to its response and downstream logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Mint a fresh UUID v4 identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for CorrelationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<CorrelationId>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Correlation id unavailable: exchange logging is not installed",
        ))
    }
}

/// Resolves and propagates correlation ids for one configured header.
#[derive(Debug, Clone)]
pub struct CorrelationContext {
    header: HeaderName,
}

impl Default for CorrelationContext {
    fn default() -> Self {
        Self {
            header: HeaderName::from_static("correlationid"),
        }
    }
}

impl CorrelationContext {
    /// Create a context for the given header name.
    pub fn new(header: &str) -> Result<Self, InvalidHeaderName> {
        Ok(Self {
            header: HeaderName::from_bytes(header.as_bytes())?,
        })
    }

    pub fn header_name(&self) -> &HeaderName {
        &self.header
    }

    /// Id from the header set, or a fresh one when absent or unusable.
    ///
    /// Repeated fields are joined with `", "`, matching the projected headers.
    pub fn resolve_headers(&self, headers: &HeaderMap) -> CorrelationId {
        let values: Result<Vec<&str>, _> = headers
            .get_all(&self.header)
            .iter()
            .map(|v| v.to_str())
            .collect();
        match values {
            Ok(values) if values.iter().any(|v| !v.is_empty()) => {
                CorrelationId(values.join(", "))
            }
            Ok(_) => CorrelationId::generate(),
            Err(_) => {
                let id = CorrelationId::generate();
                tracing::warn!(
                    header = %self.header,
                    correlation_id = %id,
                    "Inbound correlation header is not visible ASCII, generated a new id"
                );
                id
            }
        }
    }

    /// Resolve once per exchange.
    ///
    /// A value stored by an earlier stage wins; otherwise the id is resolved
    /// from the headers and stored in the request extensions.
    pub fn resolve<B>(&self, request: &mut Request<B>) -> CorrelationId {
        if let Some(id) = request.extensions().get::<CorrelationId>() {
            return id.clone();
        }
        let id = self.resolve_headers(request.headers());
        request.extensions_mut().insert(id.clone());
        id
    }

    /// Write the id into an outgoing header set, replacing any previous value.
    pub fn inject(&self, headers: &mut HeaderMap, id: &CorrelationId) {
        match HeaderValue::from_str(id.as_str()) {
            Ok(value) => {
                headers.insert(self.header.clone(), value);
            }
            Err(e) => {
                tracing::warn!(correlation_id = %id, error = %e, "Correlation id not usable as header value");
            }
        }
    }
}
