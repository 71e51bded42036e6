//! Storage module
//!
//! The consumed storage interface and its object_store-backed
//! implementation.
//!
//! # Overview
//!
//! Writers hand bytes to a [`StorageManager`] through three primitives:
//! `append` (durable incremental write), `commit` (finalize the object) and
//! `exists`. [`CloudStorage`] implements the interface on top of
//! `object_store`, supporting S3, GCS, Azure, local filesystem and
//! in-memory destinations.

mod manager;

pub use manager::{CloudStorage, StorageManager};
