//! Record model
//!
//! Defines the immutable record consumed by the pipeline and the closed
//! tagged union of field values it carries.
//!
//! # Overview
//!
//! A [`SinkRecord`] is produced by the external stream runtime: a structured
//! value plus its origin topic, the partition index it arrived on, and its
//! monotonically increasing offset within that partition. The pipeline
//! consumes records and never mutates them.

mod value;

pub use value::{FieldValue, StructValue};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single record delivered by the stream runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkRecord {
    /// Logical channel name the record belongs to
    pub topic: String,
    /// Partition index within the topic
    pub partition: i32,
    /// Position within the partition
    pub offset: i64,
    /// Structured payload
    pub value: FieldValue,
    /// Optional per-record headers
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

impl SinkRecord {
    /// Create a new record
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64, value: FieldValue) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
            value,
            headers: HashMap::new(),
        }
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// The structured payload, if the value is a struct
    pub fn as_struct(&self) -> Option<&StructValue> {
        match &self.value {
            FieldValue::Struct(s) => Some(s),
            _ => None,
        }
    }
}
