//! # Blobsink
//!
//! A Rust-native sink pipeline for persisting partitioned record streams to
//! object storage (S3, GCS, Azure Blob, local filesystem).
//!
//! ## Features
//!
//! - **Pluggable partitioning**: group records by partition index, a field
//!   value, or a formatted timestamp
//! - **Multiple formats**: Avro, Parquet, JSON Lines and raw byte output
//! - **Schema-aware Parquet**: per-topic JSON Schema documents fetched at
//!   startup and converted to Arrow schemas
//! - **Dead letter channel**: per-record failures are reported and skipped,
//!   never dropped silently
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use blobsink::{Result, SinkConfig, SinkContext};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = SinkConfig::from_yaml_file("pipeline.yaml")?;
//!     let context = SinkContext::open(config).await?;
//!
//!     for record in incoming_records() {
//!         context.route(&record).await?;
//!     }
//!
//!     context.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         SinkContext                             │
//! │  route(record) → writer per object path     close() → commit    │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴──────────────┬──────────────────┐
//! │  Partition   │            Format            │     Storage      │
//! ├──────────────┼──────────────────────────────┼──────────────────┤
//! │ Default      │ Avro         Parquet         │ S3               │
//! │ Field        │ JSON Lines   ByteArray       │ GCS / Azure      │
//! │ Time         │                              │ Local / Memory   │
//! └──────────────┴──────────────────────────────┴──────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the pipeline
pub mod error;

/// Common types and type aliases
pub mod types;

/// Sink configuration
pub mod config;

/// Record model consumed by the pipeline
pub mod record;

/// Struct to JSON conversion
pub mod convert;

/// Partition strategies and object paths
pub mod partition;

/// Schema store and Arrow conversion
pub mod schema;

/// Object storage managers
pub mod storage;

/// Record writer formats
pub mod format;

/// Pipeline orchestration
pub mod pipeline;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::SinkConfig;
pub use error::{Error, Result};
pub use pipeline::SinkContext;
pub use record::{FieldValue, SinkRecord, StructValue};
pub use types::FileFormat;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
