//! Store traits and types

use crate::config::DEFAULT_PROJECTION;
use crate::error::StoreError;
use crate::results::Record;
use crate::search::SearchQuery;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

/// A raw stored object, only seen by store backends
pub type Document = Map<String, Value>;

/// Opaque named handle to one searchable collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Partition {
    name: String,
}

impl Partition {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Fields a store is allowed to return for a match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    fields: Vec<String>,
}

impl Projection {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Copy the projected fields present in `document`, in projection order
    pub fn apply(&self, document: &Document) -> Record {
        let mut record = Record::new();
        for field in &self.fields {
            if let Some(value) = document.get(field) {
                record.insert(field.clone(), value.clone());
            }
        }
        record
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::new(DEFAULT_PROJECTION)
    }
}

/// Backing document store capability
///
/// Implementations are shared across concurrent partition searches and must
/// tolerate concurrent use without external locking.
#[async_trait]
pub trait Store: Send + Sync {
    /// Backend name used in logs
    fn name(&self) -> &str;

    /// Enumerate the partitions currently available
    async fn list_partitions(&self) -> Result<Vec<Partition>, StoreError>;

    /// Return the documents of `partition` matching `filter`, restricted to `projection`
    async fn find(
        &self,
        partition: &Partition,
        filter: &SearchQuery,
        projection: &Projection,
    ) -> Result<Vec<Record>, StoreError>;
}

/// Filter and project documents, shared by the in-process backends
pub fn select<'a>(
    documents: impl IntoIterator<Item = &'a Document>,
    filter: &SearchQuery,
    projection: &Projection,
) -> Vec<Record> {
    documents
        .into_iter()
        .filter(|doc| filter.matches(doc))
        .map(|doc| projection.apply(doc))
        .collect()
}
