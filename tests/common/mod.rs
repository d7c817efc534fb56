//! Shared utilities for integration and load testing.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use exchange_logger::config::{LoggerConfig, RecordFormat};
use exchange_logger::{HttpServer, LogEmitter, MemorySink, Shutdown};
use serde_json::Value;
use tokio::net::TcpListener;

/// A running server plus the records it has written.
pub struct TestServer {
    pub addr: SocketAddr,
    pub sink: MemorySink,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn records(&self) -> Vec<Value> {
        self.sink.json_records()
    }

    /// Records for one correlation id, in emission order.
    pub fn records_for(&self, correlation_id: &str) -> Vec<Value> {
        self.records()
            .into_iter()
            .filter(|r| r["Properties"]["CorrelationId"] == correlation_id)
            .collect()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Application used behind the logging layers in tests.
pub fn test_app() -> Router {
    Router::new()
        .route("/hello", get(|| async { "hello" }))
        .route("/echo", post(|body: Bytes| async move { body }))
        .route("/panic", get(explode))
        .route("/half", get(half_written))
        .route("/slow", get(slow))
}

async fn explode() -> &'static str {
    panic!("injected failure")
}

async fn half_written() -> Response {
    let chunks: Vec<Result<Bytes, io::Error>> = vec![
        Ok(Bytes::from_static(b"partial-")),
        Err(io::Error::new(io::ErrorKind::Other, "upstream closed")),
    ];
    Response::new(Body::from_stream(futures_util::stream::iter(chunks)))
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_millis(20)).await;
    "slow"
}

/// Start a server on an ephemeral port with records captured in memory.
pub async fn start_server(mut config: LoggerConfig) -> TestServer {
    config.exchange.record_format = RecordFormat::Compact;
    let sink = MemorySink::new();
    let emitter = LogEmitter::new(Arc::new(sink.clone()), config.exchange.record_format);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();

    let server = HttpServer::with_emitter(config, test_app(), emitter).unwrap();
    tokio::spawn(async move {
        let _ = server.run(listener, signal).await;
    });

    TestServer { addr, sink, shutdown }
}

/// Client that never pools connections between tests.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
