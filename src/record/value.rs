//! Field value model
//!
//! A closed tagged union over field kinds. Logical temporal kinds (date,
//! time, timestamp) are explicit variants rather than integer backing types
//! with a logical-name annotation.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A single typed field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Absent value
    Null,
    /// Boolean
    Bool(bool),
    /// 16-bit signed integer
    Int16(i16),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// 32-bit float
    Float32(f32),
    /// 64-bit float
    Float64(f64),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Calendar date without a time zone
    Date(NaiveDate),
    /// Wall-clock time without a time zone
    Time(NaiveTime),
    /// Instant in UTC
    Timestamp(DateTime<Utc>),
    /// Homogeneous or heterogeneous sequence of values
    Array(Vec<FieldValue>),
    /// Nested structured value
    Struct(StructValue),
}

impl FieldValue {
    /// Human-readable name of this value's kind
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int16(_) => "int16",
            FieldValue::Int32(_) => "int32",
            FieldValue::Int64(_) => "int64",
            FieldValue::Float32(_) => "float32",
            FieldValue::Float64(_) => "float64",
            FieldValue::String(_) => "string",
            FieldValue::Bytes(_) => "bytes",
            FieldValue::Date(_) => "date",
            FieldValue::Time(_) => "time",
            FieldValue::Timestamp(_) => "timestamp",
            FieldValue::Array(_) => "array",
            FieldValue::Struct(_) => "struct",
        }
    }

    /// Check for the null variant
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// String content, if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A named, insertion-ordered structured value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructValue {
    /// Schema name of the struct (e.g. the record type)
    pub name: String,
    fields: Vec<(String, FieldValue)>,
}

impl StructValue {
    /// Create an empty struct with the given schema name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field, builder style
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.push((name.into(), value));
        self
    }

    /// Append a field in place
    pub fn push_field(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.push((name.into(), value));
    }

    /// Look up a field by name
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Look up a dotted path like `address.city`, traversing nested structs
    pub fn get_path(&self, path: &str) -> Option<&FieldValue> {
        let mut parts = path.split('.');
        let mut current = self.get(parts.next()?)?;

        for part in parts {
            match current {
                FieldValue::Struct(nested) => current = nested.get(part)?,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Iterate fields in insertion order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the struct has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
