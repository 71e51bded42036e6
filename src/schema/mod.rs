//! Schema metadata module
//!
//! Coordinates per-topic schema documents for formats that need one.
//!
//! # Overview
//!
//! At pipeline startup every configured topic whose format requires a schema
//! has its schema document fetched from a configured URL, parsed, converted
//! to an Arrow schema, and registered in the [`SchemaStore`]. After startup
//! the store is lookup-only: the record path never performs schema I/O.

mod arrow;
mod store;
mod types;

pub use self::arrow::to_arrow_schema;
pub use self::store::{RegisteredSchema, SchemaStore};
pub use self::types::{JsonSchema, JsonType, JsonTypeOrArray, SchemaProperty};
