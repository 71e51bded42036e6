//! Sink configuration
//!
//! Typed configuration for the pipeline, loaded from YAML. An explicit
//! struct handed to constructors; components never re-parse raw properties.

use crate::error::{Error, Result};
use crate::partition::PartitionStrategy;
use crate::types::FileFormat;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Complete sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Pipeline name, used in logs
    #[serde(default = "default_name")]
    pub name: String,

    /// Topics routed through this pipeline
    pub topics: Vec<String>,

    /// Output file format
    #[serde(default)]
    pub format: FileFormat,

    /// Static path prefix for all output objects
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Destination URL (`s3://`, `gs://`, `az://`, `memory://`, or a local path)
    pub destination: String,

    /// Active partition strategy
    #[serde(default)]
    pub partition: PartitionStrategy,

    /// Buffered bytes before a streaming writer appends to storage
    #[serde(default = "default_flush_buffer_size")]
    pub flush_buffer_size: usize,

    /// Parquet-specific settings
    #[serde(default)]
    pub parquet: ParquetConfig,

    /// Avro-specific settings
    #[serde(default)]
    pub avro: AvroConfig,

    /// Per-topic schema document URLs
    ///
    /// The equivalent of the flat `<topic>.schema.url` property convention.
    #[serde(default)]
    pub schemas: HashMap<String, String>,
}

fn default_name() -> String {
    "blobsink".to_string()
}

fn default_prefix() -> String {
    "sink".to_string()
}

fn default_flush_buffer_size() -> usize {
    4 * 1024 * 1024
}

/// Parquet writer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParquetConfig {
    /// Compression codec: none, snappy, gzip, zstd
    #[serde(default = "default_parquet_compression")]
    pub compression: String,
}

impl Default for ParquetConfig {
    fn default() -> Self {
        Self {
            compression: default_parquet_compression(),
        }
    }
}

fn default_parquet_compression() -> String {
    "snappy".to_string()
}

/// Avro writer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvroConfig {
    /// Container codec: null, deflate
    #[serde(default = "default_avro_codec")]
    pub codec: String,
}

impl Default for AvroConfig {
    fn default() -> Self {
        Self {
            codec: default_avro_codec(),
        }
    }
}

fn default_avro_codec() -> String {
    "null".to_string()
}

const PARQUET_COMPRESSIONS: &[&str] = &["none", "snappy", "gzip", "zstd"];
const AVRO_CODECS: &[&str] = &["null", "deflate"];

impl SinkConfig {
    /// Minimal configuration, used as a starting point in tests and demos
    pub fn new(
        topics: Vec<String>,
        format: FileFormat,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            name: default_name(),
            topics,
            format,
            prefix: default_prefix(),
            destination: destination.into(),
            partition: PartitionStrategy::default(),
            flush_buffer_size: default_flush_buffer_size(),
            parquet: ParquetConfig::default(),
            avro: AvroConfig::default(),
            schemas: HashMap::new(),
        }
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: SinkConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&yaml)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.topics.is_empty() {
            return Err(Error::missing_field("topics"));
        }
        if self.topics.iter().any(|t| t.trim().is_empty()) {
            return Err(Error::config("topic names must not be empty"));
        }
        if self.prefix.trim().is_empty() {
            return Err(Error::missing_field("prefix"));
        }
        if self.destination.trim().is_empty() {
            return Err(Error::missing_field("destination"));
        }
        if self.flush_buffer_size == 0 {
            return Err(Error::config("flush_buffer_size must be greater than zero"));
        }
        if !PARQUET_COMPRESSIONS.contains(&self.parquet.compression.as_str()) {
            return Err(Error::config(format!(
                "unknown parquet compression '{}', expected one of {PARQUET_COMPRESSIONS:?}",
                self.parquet.compression
            )));
        }
        if !AVRO_CODECS.contains(&self.avro.codec.as_str()) {
            return Err(Error::config(format!(
                "unknown avro codec '{}', expected one of {AVRO_CODECS:?}",
                self.avro.codec
            )));
        }
        Ok(())
    }

    /// The configured schema URL for a topic, if any
    pub fn schema_url(&self, topic: &str) -> Option<&str> {
        self.schemas.get(topic).map(String::as_str)
    }

    /// Set a topic schema URL, builder style
    #[must_use]
    pub fn with_schema_url(mut self, topic: impl Into<String>, url: impl Into<String>) -> Self {
        self.schemas.insert(topic.into(), url.into());
        self
    }
}
