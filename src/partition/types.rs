//! Partition types and traits
//!
//! Defines the core partitioning abstractions.

use super::strategies::{DefaultPartitioner, FieldPartitioner, TimePartitioner};
use crate::error::Result;
use crate::record::SinkRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Trait for partition strategies
///
/// Implementations are pure functions of their inputs: identical records
/// under the same configuration always yield identical keys and paths.
pub trait Partitioner: Send + Sync {
    /// Encode the partition directory component for a record.
    ///
    /// A record missing a field required by the strategy fails with an
    /// unresolvable-partition error, which callers treat as per-record.
    fn encode_partition(&self, record: &SinkRecord) -> Result<String>;

    /// Static path prefix configured for this partitioner
    fn prefix(&self) -> &str;

    /// Generate the full object path for a record, without the format
    /// extension.
    ///
    /// Format: `<prefix>/<topic>/<encodedPartition>/<topic>+<partition>+<startOffset>`
    fn generate_path(
        &self,
        record: &SinkRecord,
        encoded_partition: &str,
        start_offset: i64,
    ) -> String {
        object_path(
            self.prefix(),
            &record.topic,
            encoded_partition,
            record.partition,
            start_offset,
        )
    }
}

/// Compose the canonical object path.
///
/// The layout is stable for compatibility with consumers scanning the
/// store: `<prefix>/<topic>/<encodedPartition>/<topic>+<partition>+<startOffset>`.
pub fn object_path(
    prefix: &str,
    topic: &str,
    encoded_partition: &str,
    partition: i32,
    start_offset: i64,
) -> String {
    format!("{prefix}/{topic}/{encoded_partition}/{topic}+{partition}+{start_offset}")
}

/// Configuration for the active partition strategy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum PartitionStrategy {
    /// Group by the record's partition index
    #[default]
    Default,

    /// Group by the value of a record field
    Field {
        /// Field name, dotted paths traverse nested structs
        field: String,
    },

    /// Group by a formatted timestamp
    Time {
        /// chrono format string for the partition directory
        #[serde(default = "default_path_format")]
        path_format: String,
        /// Record field holding the timestamp; wall clock when absent
        #[serde(default)]
        timestamp_field: Option<String>,
    },
}

fn default_path_format() -> String {
    "year=%Y/month=%m/day=%d".to_string()
}

/// Build the partitioner for a configured strategy.
///
/// Resolved once at configuration time; the record path never inspects the
/// strategy again.
pub fn make_partitioner(strategy: &PartitionStrategy, prefix: &str) -> Arc<dyn Partitioner> {
    match strategy {
        PartitionStrategy::Default => Arc::new(DefaultPartitioner::new(prefix)),
        PartitionStrategy::Field { field } => Arc::new(FieldPartitioner::new(prefix, field)),
        PartitionStrategy::Time {
            path_format,
            timestamp_field,
        } => Arc::new(TimePartitioner::new(
            prefix,
            path_format,
            timestamp_field.clone(),
        )),
    }
}
