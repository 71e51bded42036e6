//! Error types for blobsink
//!
//! This module defines the error hierarchy for the entire pipeline.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! The taxonomy distinguishes three severities:
//! - startup-fatal: configuration and schema resolution errors; pipeline
//!   construction fails and never routes a record.
//! - per-record: unresolvable partition keys and serialization failures;
//!   routed to the dead-letter reporter, processing continues.
//! - writer-fatal: the underlying storage stream is broken; the owning
//!   writer handle is unusable and must be replaced.

use thiserror::Error;

/// The main error type for blobsink
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors (startup-fatal)
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid file format: {name}")]
    InvalidFormat { name: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Schema Errors (startup-fatal)
    // ============================================================================
    #[error("Schema not found for topic '{topic}': {message}")]
    SchemaNotFound { topic: String, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // ============================================================================
    // Per-Record Errors (dead-lettered)
    // ============================================================================
    #[error("Unresolvable partition for topic '{topic}': {message}")]
    UnresolvablePartition { topic: String, message: String },

    #[error("Serialization failed: {message}")]
    Serialization { message: String },

    // ============================================================================
    // Writer / Storage Errors
    // ============================================================================
    #[error("Writer for '{path}' failed: {message}")]
    WriterFailed { path: String, message: String },

    #[error("Storage error for '{path}': {message}")]
    Storage { path: String, message: String },

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Avro error: {0}")]
    Avro(#[from] apache_avro::Error),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create a schema-not-found error
    pub fn schema_not_found(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaNotFound {
            topic: topic.into(),
            message: message.into(),
        }
    }

    /// Create an unresolvable-partition error
    pub fn unresolvable_partition(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnresolvablePartition {
            topic: topic.into(),
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a writer-fatal error
    pub fn writer_failed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WriterFailed {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this error is recoverable per-record.
    ///
    /// Per-record errors are reported to the dead-letter reporter and the
    /// pipeline continues; everything else propagates to the caller.
    pub fn is_per_record(&self) -> bool {
        matches!(
            self,
            Error::UnresolvablePartition { .. } | Error::Serialization { .. }
        )
    }
}

/// Result type alias for blobsink
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
