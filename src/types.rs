//! Common types used throughout blobsink
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// File Format
// ============================================================================

/// Serialization format for output objects
///
/// Each variant has its own writer/provider implementation, resolved once
/// at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// Avro object container files
    Avro,
    /// Parquet files (requires a registered schema per topic)
    Parquet,
    /// JSON Lines files
    #[default]
    Json,
    /// Raw byte passthrough
    ByteArray,
}

impl FileFormat {
    /// File extension for this format, including the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Avro => ".avro",
            FileFormat::Parquet => ".parquet",
            FileFormat::Json => ".json",
            FileFormat::ByteArray => ".bin",
        }
    }

    /// Whether writers for this format need a schema registered before
    /// first use.
    ///
    /// Only Parquet resolves schemas from the store; Avro derives its
    /// container schema from the records themselves.
    pub fn requires_schema(&self) -> bool {
        matches!(self, FileFormat::Parquet)
    }
}

impl FromStr for FileFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "avro" => Ok(FileFormat::Avro),
            "parquet" => Ok(FileFormat::Parquet),
            "json" => Ok(FileFormat::Json),
            "bytearray" | "byte_array" => Ok(FileFormat::ByteArray),
            other => Err(Error::InvalidFormat {
                name: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileFormat::Avro => write!(f, "avro"),
            FileFormat::Parquet => write!(f, "parquet"),
            FileFormat::Json => write!(f, "json"),
            FileFormat::ByteArray => write!(f, "bytearray"),
        }
    }
}
