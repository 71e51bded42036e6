//! Pipeline orchestration
//!
//! The [`SinkContext`] ties configuration, partitioning, format writers,
//! schemas and storage together: it routes each incoming record to the
//! writer owning that record's object path, creating writers lazily and
//! closing them all at shutdown.
//!
//! Failure handling follows three tiers: configuration and schema problems
//! are fatal at startup, per-record problems go to the
//! [`DeadLetterReporter`] and processing continues, and storage problems
//! discard the affected writer and surface to the caller.

mod context;
mod dead_letter;

pub use context::SinkContext;
pub use dead_letter::{DeadLetterReporter, FailureRecord, LogReporter, MemoryReporter};

#[cfg(test)]
mod tests;
