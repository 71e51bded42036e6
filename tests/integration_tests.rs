//! End-to-end pipeline tests
//!
//! Run full configurations against in-memory storage, with schema documents
//! served from a local mock server.

use blobsink::cli::{Cli, Runner};
use blobsink::partition::PartitionStrategy;
use blobsink::pipeline::MemoryReporter;
use blobsink::storage::{CloudStorage, StorageManager};
use blobsink::{Error, FieldValue, FileFormat, SinkConfig, SinkContext, SinkRecord, StructValue};
use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn order(partition: i32, offset: i64, region: &str) -> SinkRecord {
    let value = StructValue::new("Order")
        .with_field("id", FieldValue::Int64(offset))
        .with_field("region", FieldValue::String(region.to_string()));
    SinkRecord::new("orders", partition, offset, FieldValue::Struct(value))
}

async fn schema_server() -> MockServer {
    let document = serde_json::json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "title": "Order",
        "properties": {
            "id": {"type": "integer"},
            "region": {"type": "string"},
        },
        "required": ["id"],
    });

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders.schema.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn parquet_pipeline_writes_one_object_per_encoded_partition() {
    let server = schema_server().await;

    let mut config = SinkConfig::new(vec!["orders".into()], FileFormat::Parquet, "memory://")
        .with_schema_url("orders", format!("{}/orders.schema.json", server.uri()));
    config.partition = PartitionStrategy::Field {
        field: "region".into(),
    };

    let storage = Arc::new(CloudStorage::in_memory());
    let context = SinkContext::new(config, storage.clone()).await.unwrap();

    context.route(&order(0, 0, "EU")).await.unwrap();
    context.route(&order(0, 1, "US")).await.unwrap();
    context.route(&order(0, 2, "EU")).await.unwrap();
    assert_eq!(context.writer_count(), 2);
    context.close().await.unwrap();

    assert!(storage
        .exists("sink/orders/region=EU/orders+0+0.parquet")
        .await
        .unwrap());
    assert!(storage
        .exists("sink/orders/region=US/orders+0+1.parquet")
        .await
        .unwrap());
}

#[tokio::test]
async fn parquet_startup_fails_without_schema_url() {
    let config = SinkConfig::new(vec!["orders".into()], FileFormat::Parquet, "memory://");
    let storage = Arc::new(CloudStorage::in_memory());

    let err = SinkContext::new(config, storage).await.err().unwrap();
    assert!(matches!(err, Error::MissingConfigField { .. }));
}

#[tokio::test]
async fn parquet_startup_fails_on_unreachable_schema_url() {
    let config = SinkConfig::new(vec!["orders".into()], FileFormat::Parquet, "memory://")
        .with_schema_url("orders", "http://bad.invalid/orders.schema.json");
    let storage = Arc::new(CloudStorage::in_memory());

    let err = SinkContext::new(config, storage).await.err().unwrap();
    assert!(matches!(err, Error::SchemaNotFound { .. }));
}

#[tokio::test]
async fn parquet_startup_fails_on_missing_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = SinkConfig::new(vec!["orders".into()], FileFormat::Parquet, "memory://")
        .with_schema_url("orders", format!("{}/orders.schema.json", server.uri()));
    let storage = Arc::new(CloudStorage::in_memory());

    let err = SinkContext::new(config, storage).await.err().unwrap();
    assert!(matches!(err, Error::SchemaNotFound { .. }));
}

#[tokio::test]
async fn records_missing_partition_field_are_dead_lettered() {
    let mut config = SinkConfig::new(vec!["orders".into()], FileFormat::Json, "memory://");
    config.partition = PartitionStrategy::Field {
        field: "region".into(),
    };

    let reporter = Arc::new(MemoryReporter::new());
    let storage = Arc::new(CloudStorage::in_memory());
    let context = SinkContext::new(config, storage.clone())
        .await
        .unwrap()
        .with_reporter(reporter.clone());

    let incomplete = StructValue::new("Order").with_field("id", FieldValue::Int64(1));
    let bad = SinkRecord::new("orders", 0, 0, FieldValue::Struct(incomplete));

    context.route(&bad).await.unwrap();
    context.route(&order(0, 1, "EU")).await.unwrap();
    context.close().await.unwrap();

    assert_eq!(reporter.len(), 1);
    assert!(storage
        .exists("sink/orders/region=EU/orders+0+1.json")
        .await
        .unwrap());
}

#[tokio::test]
async fn avro_pipeline_round_trip() {
    let mut config = SinkConfig::new(vec!["orders".into()], FileFormat::Avro, "memory://");
    config.avro.codec = "deflate".to_string();

    let storage = Arc::new(CloudStorage::in_memory());
    let context = SinkContext::new(config, storage.clone()).await.unwrap();

    context.route(&order(1, 7, "EU")).await.unwrap();
    context.route(&order(1, 8, "EU")).await.unwrap();
    context.close().await.unwrap();

    assert!(storage
        .exists("sink/orders/partition=1/orders+1+7.avro")
        .await
        .unwrap());
}

// ============================================================================
// CLI
// ============================================================================

#[tokio::test]
async fn cli_validate_accepts_valid_config() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("pipeline.yaml");
    std::fs::write(
        &config_path,
        "name: replay\ntopics: [orders]\nformat: json\ndestination: memory://\n",
    )
    .unwrap();

    let cli = Cli::parse_from([
        "blobsink",
        "validate",
        "--config",
        config_path.to_str().unwrap(),
    ]);
    Runner::new(cli).run().await.unwrap();
}

#[tokio::test]
async fn cli_validate_rejects_broken_config() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("pipeline.yaml");
    std::fs::write(&config_path, "topics: []\ndestination: memory://\n").unwrap();

    let cli = Cli::parse_from([
        "blobsink",
        "validate",
        "--config",
        config_path.to_str().unwrap(),
    ]);
    assert!(Runner::new(cli).run().await.is_err());
}

#[tokio::test]
async fn cli_run_replays_jsonl_into_local_destination() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("out");

    let config_path = dir.path().join("pipeline.yaml");
    std::fs::write(
        &config_path,
        format!(
            "name: replay\ntopics: [orders]\nformat: json\ndestination: {}\n",
            dest.display()
        ),
    )
    .unwrap();

    let input_path = dir.path().join("records.jsonl");
    let mut input = std::fs::File::create(&input_path).unwrap();
    for offset in 0..3 {
        let record = order(0, offset, "EU");
        writeln!(input, "{}", serde_json::to_string(&record).unwrap()).unwrap();
    }
    writeln!(input, "not json").unwrap();
    drop(input);

    let cli = Cli::parse_from([
        "blobsink",
        "run",
        "--config",
        config_path.to_str().unwrap(),
        "--input",
        input_path.to_str().unwrap(),
    ]);
    Runner::new(cli).run().await.unwrap();

    let written =
        std::fs::read_to_string(dest.join("sink/orders/partition=0/orders+0+0.json")).unwrap();
    assert_eq!(written.lines().count(), 3);
}
