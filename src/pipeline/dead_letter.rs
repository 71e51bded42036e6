//! Dead letter reporting
//!
//! Per-record failures are reported here and the pipeline moves on; only
//! startup and storage failures stop processing.

use crate::error::Error;
use crate::record::SinkRecord;
use std::sync::Mutex;
use tracing::warn;

/// One dead-lettered record and why it failed
#[derive(Debug, Clone)]
pub struct FailureRecord {
    /// The record that could not be processed
    pub record: SinkRecord,
    /// Rendered cause
    pub cause: String,
}

/// Receives records the pipeline could not process
pub trait DeadLetterReporter: Send + Sync {
    /// Report one failed record
    fn report(&self, record: &SinkRecord, error: &Error);
}

/// Reporter that logs each failure and drops the record
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl DeadLetterReporter for LogReporter {
    fn report(&self, record: &SinkRecord, error: &Error) {
        warn!(
            topic = %record.topic,
            partition = record.partition,
            offset = record.offset,
            %error,
            "dead-lettered record"
        );
    }
}

/// Reporter that retains failures in memory, for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryReporter {
    failures: Mutex<Vec<FailureRecord>>,
}

impl MemoryReporter {
    /// Create an empty reporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the reported failures
    pub fn failures(&self) -> Vec<FailureRecord> {
        self.failures.lock().expect("reporter lock poisoned").clone()
    }

    /// Number of reported failures
    pub fn len(&self) -> usize {
        self.failures.lock().expect("reporter lock poisoned").len()
    }

    /// Whether nothing has been reported
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DeadLetterReporter for MemoryReporter {
    fn report(&self, record: &SinkRecord, error: &Error) {
        self.failures
            .lock()
            .expect("reporter lock poisoned")
            .push(FailureRecord {
                record: record.clone(),
                cause: error.to_string(),
            });
    }
}
