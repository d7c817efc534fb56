//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap an application router with the exchange logging layers
//! - Wire up tower-http middleware (tracing, timeout)
//! - Bind server to listener and serve until shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::http::header::InvalidHeaderName;
use axum::middleware::from_fn_with_state;
use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::LoggerConfig;
use crate::http::request::{request_logging_middleware, RequestObserver};
use crate::http::response::{response_logging_middleware, ResponseObserver};
use crate::lifecycle::{signals, ShutdownSignal};
use crate::observability::emitter::LogEmitter;
use crate::observability::sink;

/// Error building the server from configuration.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to open log sink: {0}")]
    Sink(#[from] std::io::Error),

    #[error("invalid correlation header: {0}")]
    Header(#[from] InvalidHeaderName),
}

/// HTTP server hosting an application behind exchange logging.
pub struct HttpServer {
    router: Router,
    config: LoggerConfig,
    emitter: LogEmitter,
}

impl HttpServer {
    /// Create a server, opening the configured sink.
    pub fn new(config: LoggerConfig, app: Router) -> Result<Self, BuildError> {
        let sink = sink::from_config(&config.sink)?;
        let emitter = LogEmitter::new(sink, config.exchange.record_format);
        Self::with_emitter(config, app, emitter)
    }

    /// Create a server writing records through `emitter`.
    pub fn with_emitter(config: LoggerConfig, app: Router, emitter: LogEmitter) -> Result<Self, BuildError> {
        let router = Self::build_router(&config, app, emitter.clone())?;
        Ok(Self {
            router,
            config,
            emitter,
        })
    }

    /// Wrap `app` with all middleware layers.
    ///
    /// Outermost first: trace → request observer → response observer → timeout → app.
    #[allow(deprecated)]
    pub fn build_router(config: &LoggerConfig, app: Router, emitter: LogEmitter) -> Result<Router, BuildError> {
        let requests = Arc::new(RequestObserver::new(&config.exchange, emitter.clone())?);
        let responses = Arc::new(ResponseObserver::new(&config.exchange, emitter)?);

        Ok(app
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(from_fn_with_state(responses, response_logging_middleware))
            .layer(from_fn_with_state(requests, request_logging_middleware))
            .layer(TraceLayer::new_for_http()))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, mut shutdown: ShutdownSignal) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            service_id = %self.config.exchange.service_id,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.recv() => {}
                    _ = signals::terminate() => {}
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Emitter shared with the observers, for application-level records.
    pub fn emitter(&self) -> &LogEmitter {
        &self.emitter
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }
}
