//! Request observation.
//!
//! # Responsibilities
//! - Resolve the exchange's correlation id
//! - Project configured request headers
//! - Capture the request body without consuming it
//! - Emit exactly one `Request` record, then hand the request on
//!
//! # Design Decisions
//! - A body is read when Content-Length > 0 or the method is POST/PUT
//! - An unreadable body degrades to an empty logged body; the downstream
//!   reader still sees the bytes and the error it would have seen
//! - Downstream work runs inside an `exchange` span carrying the id

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{InvalidHeaderName, CONTENT_LENGTH, HOST};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;

use crate::config::ExchangeConfig;
use crate::http::body::{BodyCapture, LoggedBody};
use crate::http::correlation::{CorrelationContext, CorrelationId};
use crate::http::headers::HeaderProjector;
use crate::observability::emitter::LogEmitter;
use crate::observability::metrics;
use crate::observability::record::{now_iso8601, LogRecord, RequestDetail};
use crate::observability::tracing::exchange_span;

/// Observes inbound requests and emits the request-phase record.
#[derive(Debug, Clone)]
pub struct RequestObserver {
    service_id: String,
    correlation: CorrelationContext,
    projector: HeaderProjector,
    emitter: LogEmitter,
    max_logged_body_bytes: usize,
}

impl RequestObserver {
    /// Build from the exchange configuration, using its request-phase headers.
    pub fn new(config: &ExchangeConfig, emitter: LogEmitter) -> Result<Self, InvalidHeaderName> {
        Ok(Self {
            service_id: config.service_id.clone(),
            correlation: CorrelationContext::new(&config.correlation_header)?,
            projector: HeaderProjector::new(&config.request.headers),
            emitter,
            max_logged_body_bytes: config.max_logged_body_bytes,
        })
    }

    pub fn correlation(&self) -> &CorrelationContext {
        &self.correlation
    }

    /// Log `request` and return it, readable from the start.
    pub async fn observe(&self, mut request: Request) -> (Request, CorrelationId) {
        let timestamp = now_iso8601();
        let correlation_id = self.correlation.resolve(&mut request);
        let headers = self.projector.project(request.headers());
        let url = request_url(&request);
        let method = request.method().to_string();

        let (request, body) = if declares_body(&request) {
            let (parts, body) = request.into_parts();
            let capture = BodyCapture::read(body).await;
            let logged = match capture.error() {
                None => capture.logged_text(self.max_logged_body_bytes),
                Some(e) => {
                    tracing::warn!(
                        correlation_id = %correlation_id,
                        error = %e,
                        "Request body capture failed, logging empty body"
                    );
                    metrics::record_capture_failure("request");
                    LoggedBody::default()
                }
            };
            (Request::from_parts(parts, capture.into_body()), logged)
        } else {
            (request, LoggedBody::default())
        };

        let record = LogRecord::request(
            &self.service_id,
            correlation_id.as_str(),
            RequestDetail {
                http_method: method,
                url,
                headers,
                body: body.text,
                body_truncated: body.truncated,
                timestamp,
            },
        );
        self.emitter.emit_record(&record);

        (request, correlation_id)
    }
}

/// Middleware entry point for the request phase.
pub async fn request_logging_middleware(
    State(observer): State<Arc<RequestObserver>>,
    request: Request,
    next: Next,
) -> Response {
    let (request, correlation_id) = observer.observe(request).await;
    let span = exchange_span(
        correlation_id.as_str(),
        request.method().as_str(),
        request.uri().path(),
    );
    next.run(request).instrument(span).await
}

/// Content-Length > 0, or a method that conventionally carries a body.
pub fn declares_body<B>(request: &axum::http::Request<B>) -> bool {
    let content_length = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(0);
    content_length > 0 || request.method() == Method::POST || request.method() == Method::PUT
}

/// scheme://host/path?query as seen by the service.
pub fn request_url<B>(request: &axum::http::Request<B>) -> String {
    let uri = request.uri();
    let scheme = uri.scheme_str().unwrap_or("http");
    let host = uri
        .authority()
        .map(|a| a.as_str())
        .or_else(|| request.headers().get(HOST).and_then(|v| v.to_str().ok()))
        .unwrap_or_default();
    let path_and_query = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    format!("{}://{}{}", scheme, host, path_and_query)
}
