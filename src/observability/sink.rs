//! Log sinks: where rendered records are written.
//!
//! A sink receives one complete, self-contained document per call. Sinks
//! report failures through `io::Result`; the emitter decides what to do
//! with them.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::runtime::{Handle, RuntimeFlavor};

use crate::config::{SinkConfig, SinkKind};

/// Target for rendered log records.
pub trait LogSink: Send + Sync + std::fmt::Debug {
    /// Write one rendered record.
    fn write_record(&self, record: &str) -> io::Result<()>;
}

/// Run a blocking write without stalling the other tasks on this worker.
///
/// Only a multi-thread runtime can hand its tasks to another worker; anywhere
/// else the write runs inline.
fn blocking_write<F>(write: F) -> io::Result<()>
where
    F: FnOnce() -> io::Result<()>,
{
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(write)
        }
        _ => write(),
    }
}

/// Writes records to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write_record(&self, record: &str) -> io::Result<()> {
        blocking_write(|| {
            let mut out = io::stdout().lock();
            writeln!(out, "{}", record)?;
            out.flush()
        })
    }
}

/// Writes records to standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl LogSink for StderrSink {
    fn write_record(&self, record: &str) -> io::Result<()> {
        blocking_write(|| {
            let mut out = io::stderr().lock();
            writeln!(out, "{}", record)
        })
    }
}

/// Appends records to a file.
#[derive(Debug)]
pub struct FileSink {
    file: Mutex<File>,
}

impl FileSink {
    /// Open (or create) the file in append mode.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl LogSink for FileSink {
    fn write_record(&self, record: &str) -> io::Result<()> {
        let mut line = String::with_capacity(record.len() + 1);
        line.push_str(record);
        line.push('\n');
        blocking_write(|| {
            // Whole record under one lock so concurrent exchanges never interleave.
            let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
            file.write_all(line.as_bytes())
        })
    }
}

/// Forwards records to the `tracing` pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write_record(&self, record: &str) -> io::Result<()> {
        tracing::info!(target: "exchange_logger::records", "{}", record);
        Ok(())
    }
}

/// Keeps records in memory. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far.
    pub fn records(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Records parsed back into JSON values, skipping anything unparsable.
    pub fn json_records(&self) -> Vec<serde_json::Value> {
        self.records()
            .iter()
            .filter_map(|r| serde_json::from_str(r).ok())
            .collect()
    }

    pub fn clear(&self) {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl LogSink for MemorySink {
    fn write_record(&self, record: &str) -> io::Result<()> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.to_string());
        Ok(())
    }
}

/// Build the sink described by configuration.
pub fn from_config(config: &SinkConfig) -> io::Result<Arc<dyn LogSink>> {
    let sink: Arc<dyn LogSink> = match config.kind {
        SinkKind::Stdout => Arc::new(StdoutSink),
        SinkKind::Stderr => Arc::new(StderrSink),
        SinkKind::Tracing => Arc::new(TracingSink),
        SinkKind::File => {
            let path = config.path.as_deref().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "file sink requires a path")
            })?;
            Arc::new(FileSink::open(path)?)
        }
    };
    Ok(sink)
}
