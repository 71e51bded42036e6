//! Avro object container writer
//!
//! Buffers records and emits one Avro object container file per object path
//! at close. The container schema is inferred from the first record's struct
//! shape; every field is nullable so later records may omit values.

use super::types::{RecordWriter, RecordWriterProvider, WriterState};
use crate::config::SinkConfig;
use crate::error::{Error, Result};
use crate::record::{FieldValue, SinkRecord, StructValue};
use crate::storage::StorageManager;
use crate::types::FileFormat;
use apache_avro::types::Value as AvroValue;
use apache_avro::{Codec, Schema, Writer};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{NaiveDate, Timelike};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Provider for Avro container writers
#[derive(Debug, Clone)]
pub struct AvroWriterProvider {
    codec: Codec,
}

impl Default for AvroWriterProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl AvroWriterProvider {
    /// Create a provider with no block compression
    pub fn new() -> Self {
        Self { codec: Codec::Null }
    }
}

impl RecordWriterProvider for AvroWriterProvider {
    fn configure(&mut self, config: &SinkConfig) -> Result<()> {
        self.codec = match config.avro.codec.as_str() {
            "null" => Codec::Null,
            "deflate" => Codec::Deflate,
            other => return Err(Error::config(format!("unknown avro codec '{other}'"))),
        };
        debug!(codec = %config.avro.codec, "configured avro writer provider");
        Ok(())
    }

    fn extension(&self) -> &'static str {
        FileFormat::Avro.extension()
    }

    fn new_writer(
        &self,
        storage: Arc<dyn StorageManager>,
        path: &str,
        _topic: &str,
    ) -> Result<Box<dyn RecordWriter>> {
        Ok(Box::new(AvroRecordWriter {
            storage,
            path: path.to_string(),
            codec: self.codec,
            schema: None,
            values: Vec::new(),
            state: WriterState::Writing,
            failure: None,
        }))
    }
}

struct AvroRecordWriter {
    storage: Arc<dyn StorageManager>,
    path: String,
    codec: Codec,
    schema: Option<Schema>,
    values: Vec<AvroValue>,
    state: WriterState,
    failure: Option<String>,
}

impl AvroRecordWriter {
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

    fn encode_file(&mut self) -> Result<Vec<u8>> {
        let Some(schema) = self.schema.as_ref() else {
            return Err(Error::serialization("no records buffered for avro file"));
        };
        let mut writer = Writer::with_codec(schema, Vec::new(), self.codec);
        for value in self.values.drain(..) {
            writer.append(value)?;
        }
        Ok(writer.into_inner()?)
    }
}

#[async_trait]
impl RecordWriter for AvroRecordWriter {
    async fn write(&mut self, record: &SinkRecord) -> Result<()> {
        self.check_writable()?;

        let value = record.as_struct().ok_or_else(|| {
            Error::serialization(format!(
                "avro needs struct values, got '{}'",
                record.value.kind()
            ))
        })?;

        // The first record fixes the container schema.
        if self.schema.is_none() {
            let document = infer_record_schema(value, "record")?;
            self.schema = Some(Schema::parse_str(&document.to_string())?);
        }

        self.values.push(encode_struct(value));
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.check_writable()?;

        if self.schema.is_none() {
            // Nothing was written; an empty container has no schema to carry.
            self.state = WriterState::Closed;
            return Ok(());
        }

        let records = self.values.len();
        let bytes = Bytes::from(self.encode_file()?);
        debug!(path = %self.path, records, bytes = bytes.len(), "writing avro file");

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
// Schema inference
// ============================================================================

/// Build an Avro record schema document from a struct's shape.
///
/// Every field is declared as `["null", T]` so that later records in the
/// same file may carry nulls where the first record had values.
fn infer_record_schema(value: &StructValue, fallback_name: &str) -> Result<serde_json::Value> {
    let name = sanitize_name(&value.name, fallback_name);
    let mut fields = Vec::new();
    for (field_name, field_value) in value.fields() {
        let inner = infer_type(field_value, &format!("{name}_{field_name}"))?;
        fields.push(json!({
            "name": field_name,
            "type": ["null", inner],
            "default": null,
        }));
    }
    Ok(json!({
        "type": "record",
        "name": name,
        "fields": fields,
    }))
}

fn infer_type(value: &FieldValue, name_hint: &str) -> Result<serde_json::Value> {
    Ok(match value {
        // An all-null first record gives no type information; string is the
        // widest readable fallback inside the nullable union.
        FieldValue::Null => json!("string"),
        FieldValue::Bool(_) => json!("boolean"),
        FieldValue::Int16(_) | FieldValue::Int32(_) => json!("int"),
        FieldValue::Int64(_) => json!("long"),
        FieldValue::Float32(_) => json!("float"),
        FieldValue::Float64(_) => json!("double"),
        FieldValue::String(_) => json!("string"),
        FieldValue::Bytes(_) => json!("bytes"),
        FieldValue::Date(_) => json!({"type": "int", "logicalType": "date"}),
        FieldValue::Time(_) => json!({"type": "long", "logicalType": "time-micros"}),
        FieldValue::Timestamp(_) => json!({"type": "long", "logicalType": "timestamp-millis"}),
        FieldValue::Array(items) => {
            let item_type = match items.first() {
                Some(first) => infer_type(first, name_hint)?,
                None => json!("null"),
            };
            json!({"type": "array", "items": item_type})
        }
        FieldValue::Struct(nested) => infer_record_schema(nested, name_hint)?,
    })
}

fn sanitize_name(name: &str, fallback: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    let cleaned = if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned
    };
    if cleaned.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{cleaned}")
    } else {
        cleaned
    }
}

// ============================================================================
// Value encoding
// ============================================================================

fn encode_struct(value: &StructValue) -> AvroValue {
    let fields = value
        .fields()
        .map(|(name, field)| (name.to_string(), encode_union(field)))
        .collect();
    AvroValue::Record(fields)
}

/// Encode one field value inside its `["null", T]` union
fn encode_union(value: &FieldValue) -> AvroValue {
    match value {
        FieldValue::Null => AvroValue::Union(0, Box::new(AvroValue::Null)),
        other => AvroValue::Union(1, Box::new(encode_value(other))),
    }
}

fn encode_value(value: &FieldValue) -> AvroValue {
    match value {
        FieldValue::Null => AvroValue::Null,
        FieldValue::Bool(b) => AvroValue::Boolean(*b),
        FieldValue::Int16(i) => AvroValue::Int(i32::from(*i)),
        FieldValue::Int32(i) => AvroValue::Int(*i),
        FieldValue::Int64(i) => AvroValue::Long(*i),
        FieldValue::Float32(f) => AvroValue::Float(*f),
        FieldValue::Float64(f) => AvroValue::Double(*f),
        FieldValue::String(s) => AvroValue::String(s.clone()),
        FieldValue::Bytes(b) => AvroValue::Bytes(b.clone()),
        FieldValue::Date(d) => AvroValue::Date(days_since_epoch(*d)),
        FieldValue::Time(t) => AvroValue::TimeMicros(
            i64::from(t.num_seconds_from_midnight()) * 1_000_000
                + i64::from(t.nanosecond() / 1_000),
        ),
        FieldValue::Timestamp(ts) => AvroValue::TimestampMillis(ts.timestamp_millis()),
        FieldValue::Array(items) => AvroValue::Array(items.iter().map(encode_value).collect()),
        FieldValue::Struct(nested) => encode_struct(nested),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn days_since_epoch(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    date.signed_duration_since(epoch).num_days() as i32
}
