//! Byte passthrough record writer
//!
//! Writes the raw value bytes of each record, separated by a newline.
//! String values pass through as UTF-8; anything else is a per-record
//! error.

use super::types::{RecordWriter, RecordWriterProvider, WriterState};
use crate::config::SinkConfig;
use crate::error::{Error, Result};
use crate::record::{FieldValue, SinkRecord};
use crate::storage::StorageManager;
use crate::types::FileFormat;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// Provider for raw byte writers
#[derive(Debug, Clone)]
pub struct ByteArrayWriterProvider {
    flush_size: usize,
}

impl Default for ByteArrayWriterProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteArrayWriterProvider {
    /// Create a provider with default flush sizing
    pub fn new() -> Self {
        Self {
            flush_size: 4 * 1024 * 1024,
        }
    }
}

impl RecordWriterProvider for ByteArrayWriterProvider {
    fn configure(&mut self, config: &SinkConfig) -> Result<()> {
        self.flush_size = config.flush_buffer_size;
        Ok(())
    }

    fn extension(&self) -> &'static str {
        FileFormat::ByteArray.extension()
    }

    fn new_writer(
        &self,
        storage: Arc<dyn StorageManager>,
        path: &str,
        _topic: &str,
    ) -> Result<Box<dyn RecordWriter>> {
        Ok(Box::new(ByteArrayRecordWriter {
            storage,
            path: path.to_string(),
            buffer: Vec::new(),
            flush_size: self.flush_size,
            state: WriterState::Writing,
            failure: None,
        }))
    }
}

struct ByteArrayRecordWriter {
    storage: Arc<dyn StorageManager>,
    path: String,
    buffer: Vec<u8>,
    flush_size: usize,
    state: WriterState,
    failure: Option<String>,
}

impl ByteArrayRecordWriter {
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
impl RecordWriter for ByteArrayRecordWriter {
    async fn write(&mut self, record: &SinkRecord) -> Result<()> {
        self.check_writable()?;

        let payload: &[u8] = match &record.value {
            FieldValue::Bytes(bytes) => bytes,
            FieldValue::String(s) => s.as_bytes(),
            other => {
                return Err(Error::serialization(format!(
                    "byte passthrough needs 'bytes' or 'string' values, got '{}'",
                    other.kind()
                )))
            }
        };

        self.buffer.extend_from_slice(payload);
        self.buffer.push(b'\n');

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
