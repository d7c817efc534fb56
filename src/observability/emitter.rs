//! Structured log emitter.
//!
//! # Responsibilities
//! - Render a record to JSON (pretty or compact)
//! - Write it through the configured sink
//! - Absorb serialization and sink failures
//!
//! # Design Decisions
//! - Emission never fails the caller: errors become a fallback record, a
//!   diagnostic event, and a metric
//! - Cheap to clone; all clones share one sink

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::config::RecordFormat;
use crate::observability::metrics;
use crate::observability::record::{now_iso8601, Level, LogRecord, LogType, Properties};
use crate::observability::sink::{LogSink, StdoutSink};

/// Writes structured log records to a sink.
#[derive(Debug, Clone)]
pub struct LogEmitter {
    sink: Arc<dyn LogSink>,
    format: RecordFormat,
}

impl Default for LogEmitter {
    fn default() -> Self {
        Self::new(Arc::new(StdoutSink), RecordFormat::default())
    }
}

impl LogEmitter {
    pub fn new(sink: Arc<dyn LogSink>, format: RecordFormat) -> Self {
        Self { sink, format }
    }

    pub fn format(&self) -> RecordFormat {
        self.format
    }

    /// Build and write a record from its parts.
    pub fn emit(&self, level: Level, message_template: &str, properties: Properties) {
        self.emit_record(&LogRecord::new(level, message_template, properties));
    }

    /// Write a prepared record.
    pub fn emit_record(&self, record: &LogRecord) {
        self.emit_document(record, record.correlation_id(), &record.message_template);
        if let Some(log_type) = record.log_type() {
            metrics::record_emitted(log_type);
        }
    }

    /// Write any serializable document.
    ///
    /// `correlation_id` and `message_template` are only used to build the
    /// fallback record when `document` cannot be serialized.
    pub fn emit_document<T: Serialize + ?Sized>(
        &self,
        document: &T,
        correlation_id: &str,
        message_template: &str,
    ) {
        let rendered = match self.render(document) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    correlation_id = %correlation_id,
                    error = %e,
                    "Failed to serialize log record, writing fallback"
                );
                metrics::record_serialization_failure();
                self.fallback(correlation_id, message_template, &e.to_string())
            }
        };

        if let Err(e) = self.sink.write_record(&rendered) {
            tracing::warn!(
                correlation_id = %correlation_id,
                error = %e,
                "Log sink write failed, record dropped"
            );
            metrics::record_sink_failure();
        }
    }

    /// Standalone success message. Generates a correlation id when none is given.
    pub fn log_success(&self, message: &str, correlation_id: Option<&str>) {
        self.log_message(message, LogType::Success, Level::Information, correlation_id);
    }

    /// Standalone error message. Generates a correlation id when none is given.
    pub fn log_error(&self, message: &str, correlation_id: Option<&str>) {
        self.log_message(message, LogType::Error, Level::Error, correlation_id);
    }

    fn log_message(&self, message: &str, log_type: LogType, level: Level, correlation_id: Option<&str>) {
        let correlation_id = correlation_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        self.emit(level, message, Properties::message(log_type, correlation_id));
    }

    fn render<T: Serialize + ?Sized>(&self, document: &T) -> serde_json::Result<String> {
        match self.format {
            RecordFormat::Pretty => serde_json::to_string_pretty(document),
            RecordFormat::Compact => serde_json::to_string(document),
        }
    }

    /// Minimal record built only from strings; cannot fail to render.
    fn fallback(&self, correlation_id: &str, message_template: &str, error: &str) -> String {
        let value = serde_json::json!({
            "Timestamp": now_iso8601(),
            "Level": Level::Warning,
            "MessageTemplate": message_template,
            "Properties": {
                "CorrelationId": correlation_id,
                "SerializationError": error,
            }
        });
        match self.format {
            RecordFormat::Pretty => format!("{:#}", value),
            RecordFormat::Compact => value.to_string(),
        }
    }
}
