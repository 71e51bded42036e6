//! Partition strategy implementations
//!
//! Each strategy handles one way of deriving the encoded partition string.

use super::types::Partitioner;
use crate::error::{Error, Result};
use crate::record::{FieldValue, SinkRecord};
use chrono::Utc;

// ============================================================================
// Default Partitioner
// ============================================================================

/// Partition-index based partitioner
///
/// Encodes `partition=<partitionIndex>`, mirroring the upstream partition
/// layout one to one.
#[derive(Debug, Clone)]
pub struct DefaultPartitioner {
    prefix: String,
}

impl DefaultPartitioner {
    /// Create a new default partitioner
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Partitioner for DefaultPartitioner {
    fn encode_partition(&self, record: &SinkRecord) -> Result<String> {
        Ok(format!("partition={}", record.partition))
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }
}

// ============================================================================
// Field Partitioner
// ============================================================================

/// Field-value based partitioner
///
/// Encodes `<field>=<value>` from a scalar record field. Dotted field names
/// traverse nested structs.
#[derive(Debug, Clone)]
pub struct FieldPartitioner {
    prefix: String,
    field: String,
}

impl FieldPartitioner {
    /// Create a new field partitioner
    pub fn new(prefix: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            field: field.into(),
        }
    }

    fn encode_value(&self, record: &SinkRecord, value: &FieldValue) -> Result<String> {
        match value {
            FieldValue::String(s) => Ok(s.clone()),
            FieldValue::Bool(b) => Ok(b.to_string()),
            FieldValue::Int16(n) => Ok(n.to_string()),
            FieldValue::Int32(n) => Ok(n.to_string()),
            FieldValue::Int64(n) => Ok(n.to_string()),
            FieldValue::Date(d) => Ok(d.format("%Y-%m-%d").to_string()),
            other => Err(Error::unresolvable_partition(
                &record.topic,
                format!(
                    "field '{}' has kind '{}', which cannot be used as a partition key",
                    self.field,
                    other.kind()
                ),
            )),
        }
    }
}

impl Partitioner for FieldPartitioner {
    fn encode_partition(&self, record: &SinkRecord) -> Result<String> {
        let value = record
            .as_struct()
            .ok_or_else(|| {
                Error::unresolvable_partition(
                    &record.topic,
                    format!(
                        "record value has kind '{}', field partitioning needs a struct",
                        record.value.kind()
                    ),
                )
            })?
            .get_path(&self.field)
            .ok_or_else(|| {
                Error::unresolvable_partition(
                    &record.topic,
                    format!("field '{}' not present in record", self.field),
                )
            })?;

        let encoded = self.encode_value(record, value)?;
        Ok(format!("{}={encoded}", self.field))
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }
}

// ============================================================================
// Time Partitioner
// ============================================================================

/// Time-based partitioner
///
/// Encodes a chrono-formatted directory (e.g. `year=2024/month=03/day=01`)
/// from a timestamp field on the record, or from the wall clock when no
/// field is configured.
#[derive(Debug, Clone)]
pub struct TimePartitioner {
    prefix: String,
    path_format: String,
    timestamp_field: Option<String>,
}

impl TimePartitioner {
    /// Create a new time partitioner
    pub fn new(
        prefix: impl Into<String>,
        path_format: impl Into<String>,
        timestamp_field: Option<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            path_format: path_format.into(),
            timestamp_field,
        }
    }
}

impl Partitioner for TimePartitioner {
    fn encode_partition(&self, record: &SinkRecord) -> Result<String> {
        let timestamp = match &self.timestamp_field {
            None => Utc::now(),
            Some(field) => {
                let value = record
                    .as_struct()
                    .and_then(|s| s.get_path(field))
                    .ok_or_else(|| {
                        Error::unresolvable_partition(
                            &record.topic,
                            format!("timestamp field '{field}' not present in record"),
                        )
                    })?;

                match value {
                    FieldValue::Timestamp(ts) => *ts,
                    other => {
                        return Err(Error::unresolvable_partition(
                            &record.topic,
                            format!(
                                "timestamp field '{field}' has kind '{}', expected 'timestamp'",
                                other.kind()
                            ),
                        ))
                    }
                }
            }
        };

        Ok(timestamp.format(&self.path_format).to_string())
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }
}
