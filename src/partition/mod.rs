//! Partition routing module
//!
//! Supports: partition-index (default), field-value, and time-based
//! partitioning.
//!
//! # Overview
//!
//! A partitioner derives two things from a record: an encoded partition
//! string (the directory component grouping related records) and the full
//! object path for the output file. Both are deterministic for a given
//! strategy configuration; downstream consumers rely on the path structure
//! for discovery.

mod strategies;
mod types;

pub use strategies::{DefaultPartitioner, FieldPartitioner, TimePartitioner};
pub use types::{make_partitioner, object_path, Partitioner, PartitionStrategy};
