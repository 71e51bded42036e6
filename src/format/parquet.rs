//! Parquet record writer
//!
//! Buffers row values and writes one Parquet file per object path at close,
//! converting rows to an Arrow RecordBatch against the schema registered
//! for the record's topic.

use super::types::{RecordWriter, RecordWriterProvider, WriterState};
use crate::config::SinkConfig;
use crate::convert::struct_to_map;
use crate::error::{Error, Result};
use crate::record::SinkRecord;
use crate::schema::{RegisteredSchema, SchemaStore};
use crate::storage::StorageManager;
use crate::types::{FileFormat, JsonValue};
use arrow::array::{
    ArrayRef, BooleanArray, Float64Array, Int64Array, ListArray, NullArray, StringArray,
    StructArray,
};
use arrow::buffer::OffsetBuffer;
use arrow::datatypes::{DataType, Field, Fields};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::sync::Arc;
use tracing::debug;

/// Provider for Parquet writers
///
/// Resolves the registered schema for each topic; schemas must be in the
/// store before the first writer is requested (enforced by pipeline startup
/// ordering).
pub struct ParquetWriterProvider {
    schema_store: Arc<SchemaStore>,
    compression: Compression,
}

impl ParquetWriterProvider {
    /// Create a provider backed by the given schema store
    pub fn new(schema_store: Arc<SchemaStore>) -> Self {
        Self {
            schema_store,
            compression: Compression::SNAPPY,
        }
    }
}

impl RecordWriterProvider for ParquetWriterProvider {
    fn configure(&mut self, config: &SinkConfig) -> Result<()> {
        self.compression = match config.parquet.compression.as_str() {
            "none" => Compression::UNCOMPRESSED,
            "snappy" => Compression::SNAPPY,
            "gzip" => Compression::GZIP(parquet::basic::GzipLevel::default()),
            "zstd" => Compression::ZSTD(parquet::basic::ZstdLevel::default()),
            other => {
                return Err(Error::config(format!(
                    "unknown parquet compression '{other}'"
                )))
            }
        };
        debug!(compression = %config.parquet.compression, "configured parquet writer provider");
        Ok(())
    }

    fn extension(&self) -> &'static str {
        FileFormat::Parquet.extension()
    }

    fn new_writer(
        &self,
        storage: Arc<dyn StorageManager>,
        path: &str,
        topic: &str,
    ) -> Result<Box<dyn RecordWriter>> {
        let schema = self.schema_store.resolve(topic)?;
        Ok(Box::new(ParquetRecordWriter {
            storage,
            path: path.to_string(),
            schema,
            rows: Vec::new(),
            compression: self.compression,
            state: WriterState::Writing,
            failure: None,
        }))
    }
}

struct ParquetRecordWriter {
    storage: Arc<dyn StorageManager>,
    path: String,
    schema: Arc<RegisteredSchema>,
    rows: Vec<JsonValue>,
    compression: Compression,
    state: WriterState,
    failure: Option<String>,
}

impl ParquetRecordWriter {
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

    fn serialize(&self, record: &SinkRecord) -> Result<JsonValue> {
        let value = record.as_struct().ok_or_else(|| {
            Error::serialization(format!(
                "parquet needs struct values, got '{}'",
                record.value.kind()
            ))
        })?;
        let map = struct_to_map(value)?;

        // Reject schema violations here so a bad record never reaches the
        // buffered rows; batch conversion at close must not fail.
        for field in self.schema.arrow.fields() {
            validate_field(field, map.get(field.name()))?;
        }
        Ok(JsonValue::Object(map))
    }

    fn encode_file(&mut self) -> Result<Vec<u8>> {
        let rows = std::mem::take(&mut self.rows);
        let batch = rows_to_batch(&rows, &self.schema.arrow)?;

        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .build();

        let mut writer = ArrowWriter::try_new(Vec::new(), batch.schema(), Some(props))?;
        writer.write(&batch)?;
        Ok(writer.into_inner()?)
    }
}

#[async_trait]
impl RecordWriter for ParquetRecordWriter {
    async fn write(&mut self, record: &SinkRecord) -> Result<()> {
        self.check_writable()?;
        let row = self.serialize(record)?;
        self.rows.push(row);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.check_writable()?;

        let rows = self.rows.len();
        let bytes = Bytes::from(self.encode_file()?);
        debug!(path = %self.path, rows, bytes = bytes.len(), "writing parquet file");

        if let Err(e) = self.storage.append(&self.path, bytes).await {
            self.state = WriterState::Failed;
            self.failure = Some(e.to_string());
            return Err(e);
        }
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

// ============================================================================
// Row validation
// ============================================================================

fn validate_field(field: &Field, value: Option<&JsonValue>) -> Result<()> {
    match value {
        None | Some(JsonValue::Null) => {
            if field.is_nullable() {
                Ok(())
            } else {
                Err(Error::serialization(format!(
                    "required field '{}' is missing or null",
                    field.name()
                )))
            }
        }
        Some(value) => validate_value(field.name(), value, field.data_type()),
    }
}

fn validate_value(name: &str, value: &JsonValue, data_type: &DataType) -> Result<()> {
    let matches = match data_type {
        DataType::Null => false,
        DataType::Boolean => value.is_boolean(),
        DataType::Int64 => value.as_i64().is_some(),
        DataType::Float64 => value.is_number(),
        DataType::Utf8 => value.is_string(),
        DataType::List(item_field) => match value {
            JsonValue::Array(items) => {
                for item in items {
                    if !item.is_null() {
                        validate_value(name, item, item_field.data_type())?;
                    }
                }
                true
            }
            _ => false,
        },
        DataType::Struct(fields) => match value {
            JsonValue::Object(map) => {
                for field in fields {
                    validate_field(field, map.get(field.name()))?;
                }
                true
            }
            _ => false,
        },
        other => {
            return Err(Error::serialization(format!(
                "unsupported arrow type '{other}' for parquet output"
            )))
        }
    };

    if matches {
        Ok(())
    } else {
        Err(Error::serialization(format!(
            "field '{name}' does not match column type '{data_type}'"
        )))
    }
}

// ============================================================================
// Row to Arrow conversion
// ============================================================================

/// Convert buffered JSON rows to a RecordBatch against a fixed schema
fn rows_to_batch(
    rows: &[JsonValue],
    schema: &arrow::datatypes::SchemaRef,
) -> Result<RecordBatch> {
    if rows.is_empty() {
        return Ok(RecordBatch::new_empty(Arc::clone(schema)));
    }

    let mut columns: Vec<ArrayRef> = Vec::new();
    for field in schema.fields() {
        let values: Vec<Option<&JsonValue>> = rows
            .iter()
            .map(|row| match row {
                JsonValue::Object(obj) => obj.get(field.name()),
                _ => None,
            })
            .collect();
        columns.push(build_array(&values, field.data_type())?);
    }

    RecordBatch::try_new(Arc::clone(schema), columns).map_err(Error::from)
}

fn build_array(values: &[Option<&JsonValue>], data_type: &DataType) -> Result<ArrayRef> {
    match data_type {
        DataType::Null => Ok(Arc::new(NullArray::new(values.len()))),

        DataType::Boolean => {
            let arr: BooleanArray = values
                .iter()
                .map(|v| v.and_then(JsonValue::as_bool))
                .collect();
            Ok(Arc::new(arr))
        }

        DataType::Int64 => {
            let arr: Int64Array = values
                .iter()
                .map(|v| v.and_then(JsonValue::as_i64))
                .collect();
            Ok(Arc::new(arr))
        }

        DataType::Float64 => {
            #[allow(clippy::cast_precision_loss)]
            let arr: Float64Array = values
                .iter()
                .map(|v| v.and_then(|v| v.as_f64().or_else(|| v.as_i64().map(|i| i as f64))))
                .collect();
            Ok(Arc::new(arr))
        }

        DataType::Utf8 => {
            let arr: StringArray = values
                .iter()
                .map(|v| {
                    v.and_then(|v| match v {
                        JsonValue::Null => None,
                        JsonValue::String(s) => Some(s.clone()),
                        other => Some(other.to_string()),
                    })
                })
                .collect();
            Ok(Arc::new(arr))
        }

        DataType::List(field) => build_list_array(values, field),

        DataType::Struct(fields) => build_struct_array(values, fields),

        other => Err(Error::serialization(format!(
            "unsupported arrow type '{other}' for parquet output"
        ))),
    }
}

fn build_list_array(values: &[Option<&JsonValue>], field: &Arc<Field>) -> Result<ArrayRef> {
    let mut all_items: Vec<Option<&JsonValue>> = Vec::new();
    let mut offsets: Vec<i32> = vec![0];

    for value in values {
        if let Some(JsonValue::Array(items)) = value {
            for item in items {
                all_items.push(Some(item));
            }
        }
        let offset = i32::try_from(all_items.len())
            .map_err(|_| Error::serialization("array too large for i32 offset"))?;
        offsets.push(offset);
    }

    let items_array = build_array(&all_items, field.data_type())?;
    let offset_buffer = OffsetBuffer::new(offsets.into());

    let list_array = ListArray::new(Arc::clone(field), offset_buffer, items_array, None);
    Ok(Arc::new(list_array))
}

fn build_struct_array(values: &[Option<&JsonValue>], fields: &Fields) -> Result<ArrayRef> {
    let mut child_arrays: Vec<ArrayRef> = Vec::new();

    for field in fields {
        let child_values: Vec<Option<&JsonValue>> = values
            .iter()
            .map(|v| {
                v.and_then(|v| match v {
                    JsonValue::Object(obj) => obj.get(field.name()),
                    _ => None,
                })
            })
            .collect();
        child_arrays.push(build_array(&child_values, field.data_type())?);
    }

    let struct_array = StructArray::new(fields.clone(), child_arrays, None);
    Ok(Arc::new(struct_array))
}
