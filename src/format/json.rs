//! JSON Lines record writer
//!
//! Serializes each record as one JSON object per line, using the
//! struct-to-map conversion for structured payloads. Bytes are appended to
//! storage whenever the local buffer exceeds the configured flush size.

use super::types::{RecordWriter, RecordWriterProvider, WriterState};
use crate::config::SinkConfig;
use crate::convert::{field_to_json, struct_to_map};
use crate::error::{Error, Result};
use crate::record::{FieldValue, SinkRecord};
use crate::storage::StorageManager;
use crate::types::{FileFormat, JsonValue};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

/// Provider for JSON Lines writers
#[derive(Debug, Clone)]
pub struct JsonWriterProvider {
    flush_size: usize,
}

impl Default for JsonWriterProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonWriterProvider {
    /// Create a provider with default flush sizing
    pub fn new() -> Self {
        Self {
            flush_size: 4 * 1024 * 1024,
        }
    }
}

impl RecordWriterProvider for JsonWriterProvider {
    fn configure(&mut self, config: &SinkConfig) -> Result<()> {
        self.flush_size = config.flush_buffer_size;
        debug!(flush_size = self.flush_size, "configured json writer provider");
        Ok(())
    }

    fn extension(&self) -> &'static str {
        FileFormat::Json.extension()
    }

    fn new_writer(
        &self,
        storage: Arc<dyn StorageManager>,
        path: &str,
        _topic: &str,
    ) -> Result<Box<dyn RecordWriter>> {
        Ok(Box::new(JsonRecordWriter {
            storage,
            path: path.to_string(),
            buffer: Vec::new(),
            flush_size: self.flush_size,
            state: WriterState::Writing,
            failure: None,
        }))
    }
}

struct JsonRecordWriter {
    storage: Arc<dyn StorageManager>,
    path: String,
    buffer: Vec<u8>,
    flush_size: usize,
    state: WriterState,
    failure: Option<String>,
}

impl JsonRecordWriter {
    fn check_writable(&self) -> Result<()> {
        match self.state {
            WriterState::Writing => Ok(()),
            WriterState::Failed => Err(Error::writer_failed(
                &self.path,
                self.failure.clone().unwrap_or_else(|| "unknown".to_string()),
            )),
            WriterState::Closed => Err(Error::writer_failed(&self.path, "writer already closed")),
        }
    }

    fn serialize(&self, record: &SinkRecord) -> Result<Vec<u8>> {
        let json: JsonValue = match &record.value {
            FieldValue::Struct(value) => JsonValue::Object(struct_to_map(value)?),
            other => field_to_json(other)?,
        };

        let mut line = serde_json::to_vec(&json)
            .map_err(|e| Error::serialization(format!("failed to encode record: {e}")))?;
        line.push(b'\n');
        Ok(line)
    }

    async fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let bytes = Bytes::from(std::mem::take(&mut self.buffer));
        if let Err(e) = self.storage.append(&self.path, bytes).await {
            self.state = WriterState::Failed;
            self.failure = Some(e.to_string());
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl RecordWriter for JsonRecordWriter {
    async fn write(&mut self, record: &SinkRecord) -> Result<()> {
        self.check_writable()?;

        // Serialize fully before touching the buffer; a failing record
        // must not corrupt previously written ones.
        let line = self.serialize(record)?;
        self.buffer.extend_from_slice(&line);

        if self.buffer.len() >= self.flush_size {
            self.flush().await?;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.check_writable()?;
        self.flush().await?;

        if let Err(e) = self.storage.commit(&self.path).await {
            self.state = WriterState::Failed;
            self.failure = Some(e.to_string());
            return Err(e);
        }
        self.state = WriterState::Closed;
        Ok(())
    }

    fn state(&self) -> WriterState {
        self.state
    }

    fn path(&self) -> &str {
        &self.path
    }
}
