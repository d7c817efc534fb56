//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the logger.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Default name of the correlation header.
pub const DEFAULT_CORRELATION_HEADER: &str = "CorrelationId";

/// Root configuration for the exchange logger.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LoggerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Interception settings shared by both observers.
    pub exchange: ExchangeConfig,

    /// Where log records are written.
    pub sink: SinkConfig,

    /// Diagnostics of the logger process itself.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// What the Response Observer does with a downstream fault after logging it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FaultPolicy {
    /// Force a 500, deliver the buffered bytes, never re-raise.
    #[default]
    Absorb,
    /// Log, then hand the fault back to the transport.
    Propagate,
}

/// How a record is rendered before it reaches the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    /// Indented JSON document.
    #[default]
    Pretty,
    /// Single-line JSON document.
    Compact,
}

/// Settings for request/response interception.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Identifier of the wrapped service, stamped on every record.
    pub service_id: String,

    /// Header carrying the correlation identifier.
    pub correlation_header: String,

    /// Upper bound on body text placed in a record (0 = unlimited).
    pub max_logged_body_bytes: usize,

    /// Downstream fault handling.
    pub fault_policy: FaultPolicy,

    /// Record rendering.
    pub record_format: RecordFormat,

    /// Request-phase settings.
    pub request: PhaseConfig,

    /// Response-phase settings.
    pub response: PhaseConfig,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            service_id: "service".to_string(),
            correlation_header: DEFAULT_CORRELATION_HEADER.to_string(),
            max_logged_body_bytes: 64 * 1024,
            fault_policy: FaultPolicy::default(),
            record_format: RecordFormat::default(),
            request: PhaseConfig::default(),
            response: PhaseConfig::default(),
        }
    }
}

/// Per-phase header allow-list.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PhaseConfig {
    /// Header names copied into the record, in this order.
    pub headers: Vec<String>,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            headers: default_headers(),
        }
    }
}

/// Header allow-list used by both phases unless overridden.
pub fn default_headers() -> Vec<String> {
    vec![
        "Host".to_string(),
        "User-Agent".to_string(),
        DEFAULT_CORRELATION_HEADER.to_string(),
    ]
}

/// Destination kind for log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Stdout,
    Stderr,
    File,
    Tracing,
}

/// Log sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SinkConfig {
    pub kind: SinkKind,

    /// File path, required when `kind = "file"`.
    pub path: Option<String>,
}

/// Format of the process's own diagnostic output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Diagnostic output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: LoggerConfig = toml::from_str("").unwrap();
        assert_eq!(config.exchange.service_id, "service");
        assert_eq!(config.exchange.correlation_header, "CorrelationId");
        assert_eq!(config.exchange.request.headers, default_headers());
        assert_eq!(config.exchange.response.headers, default_headers());
        assert_eq!(config.exchange.fault_policy, FaultPolicy::Absorb);
        assert_eq!(config.sink.kind, SinkKind::Stdout);
    }

    #[test]
    fn phases_override_independently() {
        let config: LoggerConfig = toml::from_str(
            r#"
            [exchange]
            service_id = "orders"
            fault_policy = "propagate"
            record_format = "compact"

            [exchange.response]
            headers = []

            [sink]
            kind = "file"
            path = "/var/log/orders.jsonl"
            "#,
        )
        .unwrap();

        assert_eq!(config.exchange.service_id, "orders");
        assert_eq!(config.exchange.fault_policy, FaultPolicy::Propagate);
        assert_eq!(config.exchange.record_format, RecordFormat::Compact);
        assert_eq!(config.exchange.request.headers, default_headers());
        assert!(config.exchange.response.headers.is_empty());
        assert_eq!(config.sink.kind, SinkKind::File);
        assert_eq!(config.sink.path.as_deref(), Some("/var/log/orders.jsonl"));
    }
}
