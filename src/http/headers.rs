//! Header projection.
//!
//! Copies a configured allow-list of headers out of a header set.
//! Lookup is case-insensitive (`HeaderMap` semantics); the configured
//! spelling is used as the output key. Absent headers are omitted.

use axum::http::{HeaderMap, HeaderName};

use crate::observability::record::ProjectedHeaders;

/// Projects a fixed, ordered set of header names.
#[derive(Debug, Clone, Default)]
pub struct HeaderProjector {
    names: Vec<(String, HeaderName)>,
}

impl HeaderProjector {
    /// Build a projector. Invalid names are skipped, duplicates keep the first spelling.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut projected: Vec<(String, HeaderName)> = Vec::new();
        for name in names {
            let name = name.as_ref();
            match HeaderName::from_bytes(name.as_bytes()) {
                Ok(header) if projected.iter().all(|(_, h)| *h != header) => {
                    projected.push((name.to_string(), header));
                }
                Ok(_) => {}
                Err(_) => tracing::warn!(header = %name, "Ignoring invalid header name in allow-list"),
            }
        }
        Self { names: projected }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Extract the configured headers present in `headers`.
    ///
    /// Repeated fields are combined with `", "` in arrival order.
    pub fn project(&self, headers: &HeaderMap) -> ProjectedHeaders {
        let mut out = ProjectedHeaders::new();
        for (label, name) in &self.names {
            let mut values = headers.get_all(name).iter().peekable();
            if values.peek().is_none() {
                continue;
            }
            let joined = values
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            out.push(label.clone(), joined);
        }
        out
    }
}
