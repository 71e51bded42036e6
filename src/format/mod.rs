//! Record writer formats
//!
//! One writer/provider implementation per output format.
//!
//! # Overview
//!
//! A [`RecordWriterProvider`] is configured once from the sink configuration
//! and hands out one [`RecordWriter`] per distinct object path. Writers own
//! exactly one open output stream: they accumulate records, serialize them
//! according to the format's on-wire representation, and guarantee on close
//! that every buffered byte reached storage.
//!
//! Serialization failures are per-record: the writer reports them and keeps
//! accepting records. Storage failures are terminal: the writer transitions
//! to `Failed` and every further call fails with the same cause.

mod avro;
mod bytearray;
mod json;
mod parquet;
mod types;

pub use self::avro::AvroWriterProvider;
pub use self::bytearray::ByteArrayWriterProvider;
pub use self::json::JsonWriterProvider;
pub use self::parquet::ParquetWriterProvider;
pub use self::types::{provider_for, RecordWriter, RecordWriterProvider, WriterState};
