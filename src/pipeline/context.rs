//! Pipeline context
//!
//! Owns the configured collaborators and routes records to writers. One
//! writer exists per distinct object path; writers are created lazily on
//! the first record routed to their path and closed together at shutdown.

use super::dead_letter::{DeadLetterReporter, LogReporter};
use crate::config::SinkConfig;
use crate::error::{Error, Result};
use crate::format::{provider_for, RecordWriter, RecordWriterProvider};
use crate::partition::{make_partitioner, Partitioner};
use crate::record::SinkRecord;
use crate::schema::SchemaStore;
use crate::storage::{CloudStorage, StorageManager};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Identity of one open writer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct WriterKey {
    topic: String,
    partition: i32,
    encoded_partition: String,
}

type WriterCell = Arc<tokio::sync::Mutex<Box<dyn RecordWriter>>>;

/// Orchestrates routing of records into per-path writers
///
/// Construction is fail-fast: configuration problems and missing schemas
/// surface before any record is accepted. Afterwards, per-record failures
/// go to the dead letter reporter and processing continues; storage
/// failures discard the affected writer and propagate.
pub struct SinkContext {
    config: SinkConfig,
    storage: Arc<dyn StorageManager>,
    partitioner: Arc<dyn Partitioner>,
    provider: Box<dyn RecordWriterProvider>,
    schema_store: Arc<SchemaStore>,
    reporter: Arc<dyn DeadLetterReporter>,
    writers: Mutex<HashMap<WriterKey, WriterCell>>,
}

impl SinkContext {
    /// Build a context over explicit storage.
    ///
    /// Registers schemas for every configured topic when the format needs
    /// them; a topic without a schema URL, an unreachable URL, or a
    /// malformed document all fail here.
    pub async fn new(config: SinkConfig, storage: Arc<dyn StorageManager>) -> Result<Self> {
        config.validate()?;

        let schema_store = Arc::new(SchemaStore::new());
        if config.format.requires_schema() {
            for topic in &config.topics {
                let url = config
                    .schema_url(topic)
                    .ok_or_else(|| Error::missing_field(format!("schemas.{topic}")))?;
                schema_store.register(topic, url).await?;
            }
        }

        let partitioner = make_partitioner(&config.partition, &config.prefix);
        let mut provider = provider_for(config.format, Arc::clone(&schema_store));
        provider.configure(&config)?;

        info!(
            name = %config.name,
            format = %config.format,
            topics = config.topics.len(),
            "pipeline context ready"
        );

        Ok(Self {
            config,
            storage,
            partitioner,
            provider,
            schema_store,
            reporter: Arc::new(LogReporter),
            writers: Mutex::new(HashMap::new()),
        })
    }

    /// Build a context, creating storage from the configured destination URL
    pub async fn open(config: SinkConfig) -> Result<Self> {
        let storage = Arc::new(CloudStorage::parse(&config.destination)?);
        Self::new(config, storage).await
    }

    /// Replace the dead letter reporter, builder style
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn DeadLetterReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Route one record to its writer.
    ///
    /// Per-record failures are reported and swallowed; the returned error
    /// is always writer-fatal (storage) and the affected writer has been
    /// discarded when it surfaces.
    pub async fn route(&self, record: &SinkRecord) -> Result<()> {
        if !self.config.topics.iter().any(|t| t == &record.topic) {
            let err = Error::unresolvable_partition(
                &record.topic,
                "topic is not configured for this pipeline",
            );
            self.reporter.report(record, &err);
            return Ok(());
        }

        let encoded = match self.partitioner.encode_partition(record) {
            Ok(encoded) => encoded,
            Err(err) if err.is_per_record() => {
                self.reporter.report(record, &err);
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        let key = WriterKey {
            topic: record.topic.clone(),
            partition: record.partition,
            encoded_partition: encoded.clone(),
        };
        let cell = self.writer_for(&key, record, &encoded)?;

        let mut writer = cell.lock().await;
        match writer.write(record).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_per_record() => {
                self.reporter.report(record, &err);
                Ok(())
            }
            Err(err) => {
                let path = writer.path().to_string();
                error!(%path, %err, "writer failed, discarding");
                drop(writer);
                self.writers
                    .lock()
                    .expect("writer map lock poisoned")
                    .remove(&key);
                // A fresh writer may reuse the path; staged bytes from the
                // discarded one must not leak into it.
                if let Err(abort_err) = self.storage.abort(&path).await {
                    warn!(%path, %abort_err, "failed to discard staged bytes");
                }
                Err(err)
            }
        }
    }

    /// Close every open writer, committing their objects.
    ///
    /// Every writer is attempted; the first error is returned after all of
    /// them have run.
    pub async fn close(&self) -> Result<()> {
        let drained: Vec<(WriterKey, WriterCell)> = self
            .writers
            .lock()
            .expect("writer map lock poisoned")
            .drain()
            .collect();

        let mut first_error = None;
        for (key, cell) in drained {
            let mut writer = cell.lock().await;
            if let Err(err) = writer.close().await {
                error!(path = writer.path(), %err, "failed to close writer");
                first_error.get_or_insert(err);
            } else {
                debug!(
                    topic = %key.topic,
                    path = writer.path(),
                    "closed writer"
                );
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Number of currently open writers
    pub fn writer_count(&self) -> usize {
        self.writers.lock().expect("writer map lock poisoned").len()
    }

    /// The active configuration
    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    /// The storage manager backing this pipeline
    pub fn storage(&self) -> &Arc<dyn StorageManager> {
        &self.storage
    }

    /// The schema store populated at startup
    pub fn schema_store(&self) -> &Arc<SchemaStore> {
        &self.schema_store
    }

    /// Look up or create the writer for a key.
    ///
    /// Creation happens under the map lock so at most one writer ever
    /// exists per path. The path is fixed by the first record routed to
    /// the key; its offset becomes the file's start offset.
    fn writer_for(
        &self,
        key: &WriterKey,
        record: &SinkRecord,
        encoded: &str,
    ) -> Result<WriterCell> {
        let mut writers = self.writers.lock().expect("writer map lock poisoned");
        if let Some(cell) = writers.get(key) {
            return Ok(Arc::clone(cell));
        }

        let path = format!(
            "{}{}",
            self.partitioner.generate_path(record, encoded, record.offset),
            self.provider.extension()
        );
        debug!(topic = %record.topic, %path, "creating writer");

        let writer = self
            .provider
            .new_writer(Arc::clone(&self.storage), &path, &record.topic)?;
        let cell: WriterCell = Arc::new(tokio::sync::Mutex::new(writer));
        writers.insert(key.clone(), Arc::clone(&cell));
        Ok(cell)
    }
}
