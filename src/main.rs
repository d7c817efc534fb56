//! Exchange logger demo service.
//!
//! Serves a small application behind the exchange logging layers.
//!
//! ```text
//!     Client ──▶ TraceLayer ──▶ Request Observer ──▶ Response Observer ──▶ Timeout ──▶ app
//!                                      │                     │
//!                                      ▼                     ▼
//!                                 Request record      Success/Error record
//!                                      └──────── LogEmitter ─┘
//!                                                   │
//!                                                   ▼
//!                                  sink (stdout / stderr / file / tracing)
//! ```

use std::path::PathBuf;

use axum::body::Bytes;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Router};
use clap::Parser;
use tokio::net::TcpListener;

use exchange_logger::config::{load_config, LoggerConfig};
use exchange_logger::observability::{logging, metrics, sink};
use exchange_logger::{CorrelationId, HttpServer, LogEmitter, Shutdown};

#[derive(Parser)]
#[command(name = "exchange-logger")]
#[command(about = "HTTP service with structured request/response logging", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => LoggerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_tracing(&config.observability);
    tracing::info!("exchange-logger v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        service_id = %config.exchange.service_id,
        sink = ?config.sink.kind,
        fault_policy = ?config.exchange.fault_policy,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let emitter = LogEmitter::new(sink::from_config(&config.sink)?, config.exchange.record_format);
    let app = demo_app(emitter.clone());

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::with_emitter(config, app, emitter)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Demo application wrapped by the logging layers.
fn demo_app(emitter: LogEmitter) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/echo", post(echo).put(echo))
        .route("/status/{code}", get(status))
        .route("/panic", get(panic_handler))
        .layer(Extension(emitter))
}

async fn echo(
    id: CorrelationId,
    Extension(emitter): Extension<LogEmitter>,
    body: Bytes,
) -> Bytes {
    emitter.log_success(&format!("Echoed {} bytes", body.len()), Some(id.as_str()));
    body
}

async fn status(Path(code): Path<u16>) -> Result<StatusCode, (StatusCode, &'static str)> {
    StatusCode::from_u16(code).map_err(|_| (StatusCode::BAD_REQUEST, "Invalid status code"))
}

async fn panic_handler() -> &'static str {
    panic!("demo fault requested")
}
