use super::*;
use crate::config::SinkConfig;
use crate::error::{Error, Result};
use crate::partition::PartitionStrategy;
use crate::record::{FieldValue, SinkRecord, StructValue};
use crate::storage::{CloudStorage, StorageManager};
use crate::types::FileFormat;
use async_trait::async_trait;
use bytes::Bytes;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

fn order_record(partition: i32, offset: i64, region: &str) -> SinkRecord {
    let value = StructValue::new("Order")
        .with_field("id", FieldValue::Int64(offset))
        .with_field("region", FieldValue::String(region.to_string()));
    SinkRecord::new("orders", partition, offset, FieldValue::Struct(value))
}

fn json_config(partition: PartitionStrategy) -> SinkConfig {
    let mut config = SinkConfig::new(vec!["orders".into()], FileFormat::Json, "memory://");
    config.partition = partition;
    config
}

async fn context(config: SinkConfig) -> (SinkContext, Arc<CloudStorage>) {
    let storage = Arc::new(CloudStorage::in_memory());
    let context = SinkContext::new(config, storage.clone()).await.unwrap();
    (context, storage)
}

#[tokio::test]
async fn test_route_shares_writer_per_encoded_partition() {
    let strategy = PartitionStrategy::Field {
        field: "region".into(),
    };
    let (context, storage) = context(json_config(strategy)).await;

    // EU, US, EU: the third record reuses the first writer.
    context.route(&order_record(0, 0, "EU")).await.unwrap();
    context.route(&order_record(0, 1, "US")).await.unwrap();
    context.route(&order_record(0, 2, "EU")).await.unwrap();
    assert_eq!(context.writer_count(), 2);

    context.close().await.unwrap();
    assert_eq!(context.writer_count(), 0);

    // Start offset in each path is the first routed record's offset.
    assert!(storage
        .exists("sink/orders/region=EU/orders+0+0.json")
        .await
        .unwrap());
    assert!(storage
        .exists("sink/orders/region=US/orders+0+1.json")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_concurrent_routes_share_one_writer_per_path() {
    let temp_dir = tempfile::tempdir().unwrap();
    let strategy = PartitionStrategy::Field {
        field: "region".into(),
    };
    let storage = Arc::new(CloudStorage::parse(temp_dir.path().to_str().unwrap()).unwrap());
    let context = Arc::new(
        SinkContext::new(json_config(strategy), storage)
            .await
            .unwrap(),
    );

    // Tasks interleave on two encoded partitions; even offsets go to EU,
    // odd ones to US.
    let mut handles = Vec::new();
    for task in 0..8i64 {
        let context = Arc::clone(&context);
        handles.push(tokio::spawn(async move {
            for i in 0..5i64 {
                let offset = task * 5 + i;
                let region = if offset % 2 == 0 { "EU" } else { "US" };
                context.route(&order_record(0, offset, region)).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(context.writer_count(), 2);
    context.close().await.unwrap();

    // Exactly one object per encoded partition, with no records lost.
    let mut total_lines = 0;
    for region in ["EU", "US"] {
        let dir = temp_dir.path().join(format!("sink/orders/region={region}"));
        let files: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap())
            .collect();
        assert_eq!(files.len(), 1, "one object expected for region {region}");
        let contents = std::fs::read_to_string(files[0].path()).unwrap();
        total_lines += contents.lines().count();
    }
    assert_eq!(total_lines, 40);
}

#[tokio::test]
async fn test_route_default_strategy_paths() {
    let (context, storage) = context(json_config(PartitionStrategy::Default)).await;

    context.route(&order_record(3, 41, "EU")).await.unwrap();
    context.close().await.unwrap();

    assert!(storage
        .exists("sink/orders/partition=3/orders+3+41.json")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_unresolvable_partition_is_dead_lettered() {
    let strategy = PartitionStrategy::Field {
        field: "region".into(),
    };
    let reporter = Arc::new(MemoryReporter::new());
    let storage = Arc::new(CloudStorage::in_memory());
    let context = SinkContext::new(json_config(strategy), storage)
        .await
        .unwrap()
        .with_reporter(reporter.clone());

    let value = StructValue::new("Order").with_field("id", FieldValue::Int64(1));
    let bad = SinkRecord::new("orders", 0, 0, FieldValue::Struct(value));

    context.route(&bad).await.unwrap();
    context.route(&order_record(0, 1, "EU")).await.unwrap();
    context.close().await.unwrap();

    let failures = reporter.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].record.offset, 0);
    assert!(failures[0].cause.contains("region"));
}

#[tokio::test]
async fn test_unconfigured_topic_is_dead_lettered() {
    let reporter = Arc::new(MemoryReporter::new());
    let storage = Arc::new(CloudStorage::in_memory());
    let context = SinkContext::new(json_config(PartitionStrategy::Default), storage)
        .await
        .unwrap()
        .with_reporter(reporter.clone());

    let stray = SinkRecord::new("payments", 0, 0, FieldValue::Bool(true));
    context.route(&stray).await.unwrap();

    assert_eq!(reporter.len(), 1);
    assert_eq!(context.writer_count(), 0);
}

#[tokio::test]
async fn test_serialization_failure_keeps_writer_open() {
    let reporter = Arc::new(MemoryReporter::new());
    let storage = Arc::new(CloudStorage::in_memory());
    let context = SinkContext::new(json_config(PartitionStrategy::Default), storage.clone())
        .await
        .unwrap()
        .with_reporter(reporter.clone());

    context.route(&order_record(0, 0, "EU")).await.unwrap();

    let value = StructValue::new("Order").with_field("x", FieldValue::Float64(f64::NAN));
    let bad = SinkRecord::new("orders", 0, 1, FieldValue::Struct(value));
    context.route(&bad).await.unwrap();

    context.route(&order_record(0, 2, "EU")).await.unwrap();
    context.close().await.unwrap();

    assert_eq!(reporter.len(), 1);
    assert!(storage
        .exists("sink/orders/partition=0/orders+0+0.json")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_parquet_without_schema_url_fails_at_startup() {
    let config = SinkConfig::new(vec!["orders".into()], FileFormat::Parquet, "memory://");
    let storage = Arc::new(CloudStorage::in_memory());

    let err = SinkContext::new(config, storage).await.err().unwrap();
    assert!(matches!(err, Error::MissingConfigField { .. }));
    assert!(err.to_string().contains("schemas.orders"));
}

#[tokio::test]
async fn test_parquet_with_unreachable_schema_url_fails_at_startup() {
    let config = SinkConfig::new(vec!["orders".into()], FileFormat::Parquet, "memory://")
        .with_schema_url("orders", "http://bad.invalid/orders.schema.json");
    let storage = Arc::new(CloudStorage::in_memory());

    let err = SinkContext::new(config, storage).await.err().unwrap();
    assert!(matches!(err, Error::SchemaNotFound { .. }));
}

#[tokio::test]
async fn test_close_with_no_writers_is_noop() {
    let (context, _storage) = context(json_config(PartitionStrategy::Default)).await;
    context.close().await.unwrap();
}

// ============================================================================
// Storage failure handling
// ============================================================================

/// Fails the first append, then behaves like an in-memory store
#[derive(Default)]
struct FailOnceStorage {
    failed: AtomicBool,
    objects: Mutex<HashMap<String, Vec<u8>>>,
    aborted: Mutex<Vec<String>>,
}

#[async_trait]
impl StorageManager for FailOnceStorage {
    async fn append(&self, path: &str, data: Bytes) -> Result<()> {
        if !self.failed.swap(true, Ordering::SeqCst) {
            return Err(Error::storage(path, "simulated outage"));
        }
        self.objects
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .extend_from_slice(&data);
        Ok(())
    }

    async fn commit(&self, _path: &str) -> Result<()> {
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.objects.lock().unwrap().contains_key(path))
    }

    async fn abort(&self, path: &str) -> Result<()> {
        self.aborted.lock().unwrap().push(path.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn test_storage_failure_discards_writer_and_propagates() {
    let mut config = json_config(PartitionStrategy::Default);
    // Flush on every record so the outage hits during route.
    config.flush_buffer_size = 1;
    let storage = Arc::new(FailOnceStorage::default());
    let context = SinkContext::new(config, storage.clone()).await.unwrap();

    let err = context.route(&order_record(0, 0, "EU")).await.unwrap_err();
    assert!(matches!(err, Error::Storage { .. }));
    assert_eq!(context.writer_count(), 0);

    // Staged state for the discarded writer's path is released too.
    assert_eq!(
        storage.aborted.lock().unwrap().as_slice(),
        ["sink/orders/partition=0/orders+0+0.json"]
    );

    // The next record gets a fresh writer whose path starts at its offset.
    context.route(&order_record(0, 1, "EU")).await.unwrap();
    assert_eq!(context.writer_count(), 1);
    context.close().await.unwrap();

    assert!(storage
        .exists("sink/orders/partition=0/orders+0+1.json")
        .await
        .unwrap());
}
