//! Response observation.
//!
//! # Responsibilities
//! - Run the rest of the pipeline and buffer what it produces
//! - Turn downstream faults (panics, body stream errors) into a 500
//! - Emit exactly one `Success`/`Error` record per exchange
//! - Replay the buffered response, plus the correlation header, to the client
//!
//! # Exchange States
//! ```text
//! Entered → DownstreamOk | DownstreamFaulted → Logged → Flushed
//! ```
//!
//! # Design Decisions
//! - The buffer is owned by the exchange's future; dropping the future
//!   (cancellation) releases it
//! - Bytes written before a fault are still delivered
//! - Whether the fault reaches the transport afterwards is `FaultPolicy`

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{InvalidHeaderName, CONTENT_LENGTH};
use axum::http::response::Parts;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use futures_util::FutureExt;

use crate::config::{ExchangeConfig, FaultPolicy};
use crate::http::body::{BodyCapture, CaptureError};
use crate::http::correlation::CorrelationContext;
use crate::http::headers::HeaderProjector;
use crate::http::request::request_url;
use crate::observability::emitter::LogEmitter;
use crate::observability::metrics;
use crate::observability::record::{now_iso8601, LogRecord, ResponseDetail};

/// Why the downstream stage did not complete normally.
enum Fault {
    /// Panic while producing the response or its body.
    Panic(Box<dyn Any + Send>),
    /// Body stream error after some bytes were produced.
    Body(CaptureError),
}

impl Fault {
    fn kind(&self) -> &'static str {
        match self {
            Fault::Panic(_) => "panic",
            Fault::Body(_) => "body",
        }
    }

    fn describe(&self) -> String {
        match self {
            Fault::Panic(payload) => panic_message(payload.as_ref()),
            Fault::Body(e) => e.to_string(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Observes outgoing responses and emits the response-phase record.
#[derive(Debug, Clone)]
pub struct ResponseObserver {
    service_id: String,
    correlation: CorrelationContext,
    projector: HeaderProjector,
    emitter: LogEmitter,
    max_logged_body_bytes: usize,
    fault_policy: FaultPolicy,
}

impl ResponseObserver {
    /// Build from the exchange configuration, using its response-phase headers.
    pub fn new(config: &ExchangeConfig, emitter: LogEmitter) -> Result<Self, InvalidHeaderName> {
        Ok(Self {
            service_id: config.service_id.clone(),
            correlation: CorrelationContext::new(&config.correlation_header)?,
            projector: HeaderProjector::new(&config.response.headers),
            emitter,
            max_logged_body_bytes: config.max_logged_body_bytes,
            fault_policy: config.fault_policy,
        })
    }

    pub fn fault_policy(&self) -> FaultPolicy {
        self.fault_policy
    }

    /// Run `downstream` on `request`, log the outcome, and return the response.
    pub async fn observe<F, Fut>(&self, mut request: Request, downstream: F) -> Response
    where
        F: FnOnce(Request) -> Fut,
        Fut: Future<Output = Response>,
    {
        // Entered
        let correlation_id = self.correlation.resolve(&mut request);
        let url = request_url(&request);
        let started_at = now_iso8601();
        let start = Instant::now();

        let mut capture = BodyCapture::default();
        let (mut parts, fault) = match AssertUnwindSafe(downstream(request)).catch_unwind().await {
            Ok(response) => {
                let (parts, body) = response.into_parts();
                let drained = AssertUnwindSafe(capture.read_from(body)).catch_unwind().await;
                let fault = match drained {
                    Ok(()) => capture.take_error().map(Fault::Body),
                    Err(payload) => Some(Fault::Panic(payload)),
                };
                (parts, fault)
            }
            Err(payload) => {
                let (parts, _) = Response::new(Body::empty()).into_parts();
                (parts, Some(Fault::Panic(payload)))
            }
        };
        metrics::record_duration(start);

        // DownstreamOk | DownstreamFaulted
        if let Some(fault) = &fault {
            tracing::error!(
                correlation_id = %correlation_id,
                kind = fault.kind(),
                error = %fault.describe(),
                bytes_buffered = capture.bytes().len(),
                "Downstream fault, responding with 500"
            );
            metrics::record_downstream_fault(fault.kind());
            force_internal_error(&mut parts);
        }
        self.correlation.inject(&mut parts.headers, &correlation_id);

        // Logged
        let body = capture.logged_text(self.max_logged_body_bytes);
        let record = LogRecord::response(
            &self.service_id,
            correlation_id.as_str(),
            ResponseDetail {
                status_code: parts.status.as_u16(),
                url,
                headers: self.projector.project(&parts.headers),
                body: body.text,
                body_truncated: body.truncated,
                timestamp: started_at,
                elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
            },
        );
        self.emitter.emit_record(&record);

        // Flushed
        match (fault, self.fault_policy) {
            (Some(Fault::Panic(payload)), FaultPolicy::Propagate) => std::panic::resume_unwind(payload),
            (Some(Fault::Body(error)), FaultPolicy::Propagate) => capture.fail_with(error),
            _ => {}
        }
        Response::from_parts(parts, capture.into_body())
    }
}

/// Status 500. The handler's declared length no longer applies; the replayed
/// body's own size hint sets it again on the way out.
fn force_internal_error(parts: &mut Parts) {
    parts.status = StatusCode::INTERNAL_SERVER_ERROR;
    parts.headers.remove(CONTENT_LENGTH);
}

/// Middleware entry point for the response phase.
pub async fn response_logging_middleware(
    State(observer): State<Arc<ResponseObserver>>,
    request: Request,
    next: Next,
) -> Response {
    observer.observe(request, |request| next.run(request)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecordFormat;
    use crate::http::correlation::CorrelationId;
    use crate::observability::sink::MemorySink;
    use axum::body::Bytes;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::io;
    use tower::ServiceExt;

    fn observer_with(policy: FaultPolicy, headers: &[&str]) -> (Arc<ResponseObserver>, MemorySink) {
        let sink = MemorySink::new();
        let mut config = ExchangeConfig::default();
        config.fault_policy = policy;
        config.response.headers = headers.iter().map(|h| h.to_string()).collect();
        let emitter = LogEmitter::new(Arc::new(sink.clone()), RecordFormat::Compact);
        (Arc::new(ResponseObserver::new(&config, emitter).unwrap()), sink)
    }

    fn observer() -> (Arc<ResponseObserver>, MemorySink) {
        observer_with(FaultPolicy::Absorb, &["CorrelationId", "Content-Type"])
    }

    async fn half_written() -> Response {
        let chunks: Vec<Result<Bytes, io::Error>> = vec![
            Ok(Bytes::from_static(b"{\"items\":[")),
            Err(io::Error::new(io::ErrorKind::Other, "database went away")),
        ];
        Response::builder()
            .header(CONTENT_LENGTH, "64")
            .body(Body::from_stream(futures_util::stream::iter(chunks)))
            .unwrap()
    }

    async fn explode() -> &'static str {
        panic!("handler exploded")
    }

    fn app(observer: Arc<ResponseObserver>) -> Router {
        Router::new()
            .route("/ok", get(|| async { ([("content-type", "text/plain")], "all good") }))
            .route("/moved", get(|| async { (StatusCode::FOUND, [("location", "/ok")]) }))
            .route("/missing", get(|| async { (StatusCode::NOT_FOUND, "nope") }))
            .route("/half", get(half_written))
            .route("/panic", get(explode))
            .route("/whoami", get(|id: CorrelationId| async move { id.into_string() }))
            .layer(axum::middleware::from_fn_with_state(observer, response_logging_middleware))
    }

    fn get_request(path: &str) -> Request {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn success_is_logged_and_bytes_untouched() {
        let (observer, sink) = observer();
        let response = app(observer).oneshot(get_request("/ok")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let header_id = response.headers()["correlationid"].to_str().unwrap().to_string();
        assert_eq!(body_text(response).await, "all good");

        let records: Vec<Value> = sink.json_records();
        assert_eq!(records.len(), 1);
        let props = &records[0]["Properties"];
        assert_eq!(records[0]["Level"], "Information");
        assert_eq!(props["LogType"], "Success");
        assert_eq!(props["StatusCode"], 200);
        assert_eq!(props["Body"], "all good");
        assert_eq!(props["CorrelationId"], header_id.as_str());
        assert_eq!(props["Headers"]["CorrelationId"], header_id.as_str());
        assert_eq!(props["Headers"]["Content-Type"], "text/plain");
    }

    #[tokio::test]
    async fn redirect_counts_as_success_and_not_found_as_error() {
        let (observer, sink) = observer();
        let router = app(observer);

        let moved = router.clone().oneshot(get_request("/moved")).await.unwrap();
        assert_eq!(moved.status(), StatusCode::FOUND);
        let missing = router.oneshot(get_request("/missing")).await.unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let records = sink.json_records();
        assert_eq!(records[0]["Properties"]["LogType"], "Success");
        assert_eq!(records[1]["Properties"]["LogType"], "Error");
        assert_eq!(records[1]["Level"], "Error");
        assert_eq!(records[1]["Properties"]["Body"], "nope");
    }

    #[tokio::test]
    async fn caller_id_reaches_handler_record_and_header() {
        let (observer, sink) = observer();
        let request = Request::builder()
            .uri("/whoami")
            .header("CorrelationId", "order-123")
            .body(Body::empty())
            .unwrap();

        let response = app(observer).oneshot(request).await.unwrap();
        assert_eq!(response.headers()["correlationid"], "order-123");
        assert_eq!(body_text(response).await, "order-123");
        assert_eq!(sink.json_records()[0]["Properties"]["CorrelationId"], "order-123");
    }

    #[tokio::test]
    async fn panic_becomes_logged_500() {
        let (observer, sink) = observer();
        let response = app(observer).oneshot(get_request("/panic")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().contains_key("correlationid"));
        assert_eq!(body_text(response).await, "");

        let props = &sink.json_records()[0]["Properties"];
        assert_eq!(props["StatusCode"], 500);
        assert_eq!(props["LogType"], "Error");
    }

    #[tokio::test]
    async fn partial_body_is_delivered_after_fault() {
        let (observer, sink) = observer();
        let response = app(observer).oneshot(get_request("/half")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[CONTENT_LENGTH], "10");
        assert!(response.headers().contains_key("correlationid"));
        assert_eq!(body_text(response).await, "{\"items\":[");

        let props = &sink.json_records()[0]["Properties"];
        assert_eq!(props["StatusCode"], 500);
        assert_eq!(props["LogType"], "Error");
        assert_eq!(props["Body"], "{\"items\":[");
    }

    #[tokio::test]
    async fn propagate_replays_body_error_after_logging() {
        let (observer, sink) = observer_with(FaultPolicy::Propagate, &[]);
        let response = app(observer).oneshot(get_request("/half")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.into_body().collect().await.is_err());
        assert_eq!(sink.json_records()[0]["Properties"]["LogType"], "Error");
    }

    #[tokio::test]
    async fn propagate_resumes_panic_after_logging() {
        let (observer, sink) = observer_with(FaultPolicy::Propagate, &[]);
        let outcome = AssertUnwindSafe(app(observer).oneshot(get_request("/panic")))
            .catch_unwind()
            .await;

        assert!(outcome.is_err());
        let records = sink.json_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["Properties"]["StatusCode"], 500);
    }

    #[tokio::test]
    async fn empty_allow_list_logs_no_headers() {
        let (observer, sink) = observer_with(FaultPolicy::Absorb, &[]);
        app(observer).oneshot(get_request("/ok")).await.unwrap();
        assert_eq!(sink.json_records()[0]["Properties"]["Headers"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn dropped_exchange_emits_nothing() {
        let (observer, sink) = observer();
        let pending = observer.observe(get_request("/slow"), |_| std::future::pending::<Response>());
        let timed_out = tokio::time::timeout(std::time::Duration::from_millis(20), pending).await;

        assert!(timed_out.is_err());
        assert!(sink.records().is_empty());
    }
}
