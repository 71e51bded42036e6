//! Schema store
//!
//! Maps topic names to resolved schema artifacts. Populated at pipeline
//! startup; lookup-only afterwards.

use super::arrow::to_arrow_schema;
use super::types::JsonSchema;
use crate::error::{Error, Result};
use arrow::datatypes::SchemaRef;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::info;

/// A schema resolved for one topic
#[derive(Debug, Clone)]
pub struct RegisteredSchema {
    /// Topic the schema belongs to
    pub topic: String,
    /// Provenance URL the document was fetched from
    pub url: String,
    /// Parsed schema document
    pub document: JsonSchema,
    /// Arrow schema derived from the document
    pub arrow: SchemaRef,
}

/// Mapping from topic to resolved schema
///
/// Registration is idempotent per topic: re-registering replaces the prior
/// mapping for that topic only.
pub struct SchemaStore {
    schemas: RwLock<HashMap<String, Arc<RegisteredSchema>>>,
    http: reqwest::Client,
}

impl Default for SchemaStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            schemas: RwLock::new(HashMap::new()),
            http: reqwest::Client::new(),
        }
    }

    /// Fetch, parse and register the schema document for a topic.
    ///
    /// An unreachable URL or a malformed document is a schema-not-found
    /// error, which is fatal at startup.
    pub async fn register(&self, topic: &str, url: &str) -> Result<()> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::schema_not_found(topic, format!("failed to fetch {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::schema_not_found(
                topic,
                format!("fetching {url} returned HTTP {}", response.status().as_u16()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::schema_not_found(topic, format!("failed to read {url}: {e}")))?;

        let document: JsonSchema = serde_json::from_str(&body)
            .map_err(|e| Error::schema_not_found(topic, format!("malformed document at {url}: {e}")))?;

        let arrow = Arc::new(to_arrow_schema(&document)?);

        info!(topic, url, fields = arrow.fields().len(), "registered schema");

        let registered = Arc::new(RegisteredSchema {
            topic: topic.to_string(),
            url: url.to_string(),
            document,
            arrow,
        });

        self.schemas
            .write()
            .expect("schema store lock poisoned")
            .insert(topic.to_string(), registered);
        Ok(())
    }

    /// Look up the registered schema for a topic. No I/O.
    pub fn resolve(&self, topic: &str) -> Result<Arc<RegisteredSchema>> {
        self.schemas
            .read()
            .expect("schema store lock poisoned")
            .get(topic)
            .cloned()
            .ok_or_else(|| Error::schema_not_found(topic, "no schema registered"))
    }

    /// Whether a schema is registered for the topic
    pub fn contains(&self, topic: &str) -> bool {
        self.schemas
            .read()
            .expect("schema store lock poisoned")
            .contains_key(topic)
    }

    /// Number of registered schemas
    pub fn len(&self) -> usize {
        self.schemas
            .read()
            .expect("schema store lock poisoned")
            .len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
