//! Structured log record model.
//!
//! One record per observed event. The shape is a shared envelope
//! (`Timestamp`, `Level`, `MessageTemplate`, `Properties.CorrelationId`)
//! with an optional request or response detail flattened into `Properties`.

use chrono::{SecondsFormat, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

pub const REQUEST_TEMPLATE: &str = "HTTP Request: {@RequestLog}";
pub const RESPONSE_TEMPLATE: &str = "HTTP Response: {@ResponseLog}";

/// Current UTC time as ISO-8601.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Record severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Level {
    Information,
    Warning,
    Error,
}

/// Classification carried in `Properties.LogType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogType {
    Request,
    Response,
    Success,
    Error,
}

impl LogType {
    /// Classify a final response status: [200, 400) succeeds.
    pub fn from_status(status: u16) -> Self {
        if (200..400).contains(&status) {
            LogType::Success
        } else {
            LogType::Error
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::Request => "Request",
            LogType::Response => "Response",
            LogType::Success => "Success",
            LogType::Error => "Error",
        }
    }

    /// Severity matching this classification.
    pub fn level(&self) -> Level {
        match self {
            LogType::Error => Level::Error,
            _ => Level::Information,
        }
    }
}

/// Header name/value pairs, serialized as a JSON object in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectedHeaders(Vec<(String, String)>);

impl ProjectedHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl Serialize for ProjectedHeaders {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Request-phase detail.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RequestDetail {
    pub http_method: String,
    pub url: String,
    pub headers: ProjectedHeaders,
    pub body: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub body_truncated: bool,
    pub timestamp: String,
}

/// Response-phase detail.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseDetail {
    pub status_code: u16,
    pub url: String,
    pub headers: ProjectedHeaders,
    pub body: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub body_truncated: bool,
    /// Entry timestamp of the exchange.
    pub timestamp: String,
    pub elapsed_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Detail {
    Request(RequestDetail),
    Response(ResponseDetail),
}

/// `Properties` sub-object.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Properties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_type: Option<LogType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    pub correlation_id: String,
    #[serde(flatten)]
    pub detail: Option<Detail>,
}

impl Properties {
    /// Properties carrying only a classification and correlation id.
    pub fn message(log_type: LogType, correlation_id: impl Into<String>) -> Self {
        Self {
            log_type: Some(log_type),
            service_id: None,
            correlation_id: correlation_id.into(),
            detail: None,
        }
    }
}

/// A complete structured log document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogRecord {
    pub timestamp: String,
    pub level: Level,
    pub message_template: String,
    pub properties: Properties,
}

impl LogRecord {
    pub fn new(level: Level, message_template: impl Into<String>, properties: Properties) -> Self {
        Self {
            timestamp: now_iso8601(),
            level,
            message_template: message_template.into(),
            properties,
        }
    }

    /// Request-phase record; shares its timestamp with the detail.
    pub fn request(service_id: &str, correlation_id: &str, detail: RequestDetail) -> Self {
        Self {
            timestamp: detail.timestamp.clone(),
            level: Level::Information,
            message_template: REQUEST_TEMPLATE.to_string(),
            properties: Properties {
                log_type: Some(LogType::Request),
                service_id: Some(service_id.to_string()),
                correlation_id: correlation_id.to_string(),
                detail: Some(Detail::Request(detail)),
            },
        }
    }

    /// Response-phase record, classified by status.
    pub fn response(service_id: &str, correlation_id: &str, detail: ResponseDetail) -> Self {
        let log_type = LogType::from_status(detail.status_code);
        Self::new(
            log_type.level(),
            RESPONSE_TEMPLATE,
            Properties {
                log_type: Some(log_type),
                service_id: Some(service_id.to_string()),
                correlation_id: correlation_id.to_string(),
                detail: Some(Detail::Response(detail)),
            },
        )
    }

    pub fn log_type(&self) -> Option<LogType> {
        self.properties.log_type
    }

    pub fn correlation_id(&self) -> &str {
        &self.properties.correlation_id
    }
}
