//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate header names and addresses before any observer is built
//! - Validate value ranges (timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: LoggerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::{LoggerConfig, SinkKind};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("exchange.service_id must not be empty")]
    EmptyServiceId,

    #[error("invalid header name '{name}' in {field}")]
    InvalidHeaderName { field: &'static str, name: String },

    #[error("invalid socket address '{value}' in {field}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than 0")]
    ZeroTimeout,

    #[error("sink.path is required when sink.kind = \"file\"")]
    MissingSinkPath,
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &LoggerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let exchange = &config.exchange;

    if exchange.service_id.trim().is_empty() {
        errors.push(ValidationError::EmptyServiceId);
    }

    check_header("exchange.correlation_header", &exchange.correlation_header, &mut errors);
    for name in &exchange.request.headers {
        check_header("exchange.request.headers", name, &mut errors);
    }
    for name in &exchange.response.headers {
        check_header("exchange.response.headers", name, &mut errors);
    }

    check_address("listener.bind_address", &config.listener.bind_address, &mut errors);
    if config.observability.metrics_enabled {
        check_address(
            "observability.metrics_address",
            &config.observability.metrics_address,
            &mut errors,
        );
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.sink.kind == SinkKind::File
        && config.sink.path.as_deref().map_or(true, |p| p.trim().is_empty())
    {
        errors.push(ValidationError::MissingSinkPath);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_header(field: &'static str, name: &str, errors: &mut Vec<ValidationError>) {
    if HeaderName::from_bytes(name.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeaderName {
            field,
            name: name.to_string(),
        });
    }
}

fn check_address(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
