//! Writer types and traits
//!
//! Defines the polymorphic writer abstraction shared by all formats.

use super::avro::AvroWriterProvider;
use super::bytearray::ByteArrayWriterProvider;
use super::json::JsonWriterProvider;
use super::parquet::ParquetWriterProvider;
use crate::config::SinkConfig;
use crate::error::Result;
use crate::record::SinkRecord;
use crate::schema::SchemaStore;
use crate::storage::StorageManager;
use crate::types::FileFormat;
use async_trait::async_trait;
use std::sync::Arc;

/// Lifecycle state of a record writer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// Accepting records
    Writing,
    /// Closed cleanly; all bytes reached storage
    Closed,
    /// Terminal failure; the underlying stream is unusable
    Failed,
}

/// A writer bound to exactly one object path
#[async_trait]
pub trait RecordWriter: Send {
    /// Serialize one record and hand its bytes to storage (possibly
    /// buffered).
    ///
    /// Per-record serialization errors leave the writer in `Writing` and
    /// never corrupt previously written records. After a storage failure
    /// the writer is `Failed` and every call returns the original cause.
    async fn write(&mut self, record: &SinkRecord) -> Result<()>;

    /// Flush all buffered bytes to storage and finalize the object
    async fn close(&mut self) -> Result<()>;

    /// Current lifecycle state
    fn state(&self) -> WriterState;

    /// Object path this writer is bound to
    fn path(&self) -> &str;
}

/// Factory for record writers of one format
pub trait RecordWriterProvider: Send + Sync {
    /// Apply format-specific settings once, from the sink configuration
    fn configure(&mut self, config: &SinkConfig) -> Result<()>;

    /// File extension appended to generated paths, including the leading dot
    fn extension(&self) -> &'static str;

    /// Create a writer for one object path.
    ///
    /// Cheap to call repeatedly; writers never share mutable serialization
    /// buffers.
    fn new_writer(
        &self,
        storage: Arc<dyn StorageManager>,
        path: &str,
        topic: &str,
    ) -> Result<Box<dyn RecordWriter>>;
}

/// Resolve the provider for a format.
///
/// The strategy table is consulted once at configuration time; the record
/// path never inspects the format again.
pub fn provider_for(
    format: FileFormat,
    schema_store: Arc<SchemaStore>,
) -> Box<dyn RecordWriterProvider> {
    match format {
        FileFormat::Avro => Box::new(AvroWriterProvider::new()),
        FileFormat::Parquet => Box::new(ParquetWriterProvider::new(schema_store)),
        FileFormat::Json => Box::new(JsonWriterProvider::new()),
        FileFormat::ByteArray => Box::new(ByteArrayWriterProvider::new()),
    }
}
