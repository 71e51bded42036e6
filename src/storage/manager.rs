//! Storage manager
//!
//! Abstraction over the remote object store, plus the object_store-backed
//! implementation used by the pipeline.

use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Consumed interface to the remote object store
///
/// `append` is the durable step: once it returns, the bytes handed over so
/// far survive a pipeline crash. `commit` finalizes the object and releases
/// staging state.
#[async_trait]
pub trait StorageManager: Send + Sync {
    /// Durably append bytes to the object at `path`
    async fn append(&self, path: &str, data: Bytes) -> Result<()>;

    /// Finalize the object at `path`
    async fn commit(&self, path: &str) -> Result<()>;

    /// Whether an object exists at `path`
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Discard staged state for `path` without finalizing the object.
    ///
    /// Called when the writer owning the path is abandoned; a later writer
    /// for the same path must start from a clean slate.
    async fn abort(&self, path: &str) -> Result<()> {
        let _ = path;
        Ok(())
    }
}

/// Object-store-backed storage manager
///
/// Object stores expose whole-object puts, not appends; `append` keeps an
/// accumulated staging buffer per path and re-puts the accumulated bytes,
/// so every append is durably visible.
pub struct CloudStorage {
    store: Arc<dyn ObjectStore>,
    prefix: String,
    scheme: String,
    staged: Mutex<HashMap<String, Vec<u8>>>,
}

impl CloudStorage {
    /// Parse a destination URL and create the appropriate object store
    ///
    /// Supported formats:
    /// - `s3://bucket/path/` - AWS S3
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `az://container/path/` - Azure Blob Storage
    /// - `memory://` - in-memory store (tests, dry runs)
    /// - `/local/path/` or `file:///local/path/` - local filesystem
    pub fn parse(url: &str) -> Result<Self> {
        if url.starts_with("s3://") {
            Self::parse_s3(url)
        } else if url.starts_with("gs://") {
            Self::parse_gcs(url)
        } else if url.starts_with("az://") {
            Self::parse_azure(url)
        } else if url.starts_with("memory://") {
            Ok(Self::in_memory())
        } else {
            Self::parse_local(url)
        }
    }

    /// Create an in-memory storage manager
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            prefix: String::new(),
            scheme: "memory".to_string(),
            staged: Mutex::new(HashMap::new()),
        }
    }

    fn parse_s3(url: &str) -> Result<Self> {
        let without_scheme = url
            .strip_prefix("s3://")
            .ok_or_else(|| Error::config(format!("Invalid s3 URL: {url}")))?;
        let (bucket, prefix) = split_bucket(without_scheme);

        let store = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::config(format!("Failed to create s3 client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: "s3".to_string(),
            staged: Mutex::new(HashMap::new()),
        })
    }

    fn parse_gcs(url: &str) -> Result<Self> {
        let without_scheme = url
            .strip_prefix("gs://")
            .ok_or_else(|| Error::config(format!("Invalid GCS URL: {url}")))?;
        let (bucket, prefix) = split_bucket(without_scheme);

        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: "gs".to_string(),
            staged: Mutex::new(HashMap::new()),
        })
    }

    fn parse_azure(url: &str) -> Result<Self> {
        let without_scheme = url
            .strip_prefix("az://")
            .ok_or_else(|| Error::config(format!("Invalid Azure URL: {url}")))?;
        let (container, prefix) = split_bucket(without_scheme);

        let store = MicrosoftAzureBuilder::from_env()
            .with_container_name(container)
            .build()
            .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix,
            scheme: "az".to_string(),
            staged: Mutex::new(HashMap::new()),
        })
    }

    fn parse_local(path: &str) -> Result<Self> {
        let path = path.strip_prefix("file://").unwrap_or(path);

        std::fs::create_dir_all(path)
            .map_err(|e| Error::config(format!("Failed to create directory {path}: {e}")))?;

        let store = LocalFileSystem::new_with_prefix(path)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix: String::new(),
            scheme: "file".to_string(),
            staged: Mutex::new(HashMap::new()),
        })
    }

    /// Get the scheme (s3, gs, az, file, memory)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Check if this is a remote destination
    pub fn is_cloud(&self) -> bool {
        self.scheme != "file" && self.scheme != "memory"
    }

    fn full_path(&self, path: &str) -> ObjectPath {
        if self.prefix.is_empty() {
            ObjectPath::from(path)
        } else {
            ObjectPath::from(format!("{}/{path}", self.prefix.trim_end_matches('/')))
        }
    }

    fn stage(&self, path: &str, data: &Bytes) -> (Bytes, usize) {
        let mut staged = self.staged.lock().expect("staging lock poisoned");
        let buffer = staged.entry(path.to_string()).or_default();
        let prior_len = buffer.len();
        buffer.extend_from_slice(data);
        (Bytes::copy_from_slice(buffer), prior_len)
    }

    /// Truncate the staged buffer back to `len`, dropping the entry when
    /// nothing remains
    fn unstage(&self, path: &str, len: usize) {
        let mut staged = self.staged.lock().expect("staging lock poisoned");
        if let Some(buffer) = staged.get_mut(path) {
            buffer.truncate(len);
            if buffer.is_empty() {
                staged.remove(path);
            }
        }
    }

    fn take_staged(&self, path: &str) -> Option<Bytes> {
        self.staged
            .lock()
            .expect("staging lock poisoned")
            .remove(path)
            .map(Bytes::from)
    }
}

#[async_trait]
impl StorageManager for CloudStorage {
    async fn append(&self, path: &str, data: Bytes) -> Result<()> {
        let (accumulated, prior_len) = self.stage(path, &data);
        let object_path = self.full_path(path);

        debug!(path, bytes = accumulated.len(), "appending to object");

        // A failed put rolls the staging buffer back so the bytes that are
        // durable and the bytes that are staged stay in sync.
        if let Err(e) = self.store.put(&object_path, accumulated.into()).await {
            self.unstage(path, prior_len);
            return Err(Error::storage(path, format!("append failed: {e}")));
        }
        Ok(())
    }

    async fn commit(&self, path: &str) -> Result<()> {
        let Some(staged) = self.take_staged(path) else {
            return Ok(());
        };
        let object_path = self.full_path(path);

        debug!(path, bytes = staged.len(), "committing object");

        self.store
            .put(&object_path, staged.into())
            .await
            .map_err(|e| Error::storage(path, format!("commit failed: {e}")))?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        match self.store.head(&self.full_path(path)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(Error::storage(path, format!("head failed: {e}"))),
        }
    }

    async fn abort(&self, path: &str) -> Result<()> {
        let staged = self
            .staged
            .lock()
            .expect("staging lock poisoned")
            .remove(path);
        if let Some(staged) = staged {
            debug!(path, bytes = staged.len(), "discarded staged bytes");
        }
        Ok(())
    }
}

fn split_bucket(without_scheme: &str) -> (&str, String) {
    match without_scheme.find('/') {
        Some(idx) => (
            &without_scheme[..idx],
            without_scheme[idx + 1..].trim_end_matches('/').to_string(),
        ),
        None => (without_scheme, String::new()),
    }
}
