//! In-memory store for embedding and testing

use super::directory::documents_from_value;
use super::traits::{select, Document, Partition, Projection, Store};
use crate::error::StoreError;
use crate::results::Record;
use crate::search::SearchQuery;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone)]
enum Contents {
    Documents(Vec<Document>),
    Faulty(String),
}

#[derive(Debug, Default)]
struct State {
    partitions: Vec<(String, Contents)>,
    catalog_failure: Option<String>,
}

/// Store keeping partitions in memory, in insertion order
///
/// Partitions can be marked faulty to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn put(&self, name: String, contents: Contents) {
        let mut state = self.write();
        match state.partitions.iter().position(|(n, _)| *n == name) {
            Some(i) => state.partitions[i].1 = contents,
            None => state.partitions.push((name, contents)),
        }
    }

    /// Add or replace a partition
    pub fn insert(&self, name: impl Into<String>, documents: Vec<Document>) {
        self.put(name.into(), Contents::Documents(documents));
    }

    /// Add or replace a partition from a JSON array of objects
    pub fn insert_json(&self, name: impl Into<String>, value: Value) -> Result<(), StoreError> {
        let name = name.into();
        let documents = documents_from_value(&name, value)?;
        self.insert(name, documents);
        Ok(())
    }

    /// Add or replace a partition whose queries always fail
    pub fn insert_faulty(&self, name: impl Into<String>, message: impl Into<String>) {
        self.put(name.into(), Contents::Faulty(message.into()));
    }

    /// Drop a partition, as if its collection were deleted
    pub fn remove(&self, name: &str) {
        self.write().partitions.retain(|(n, _)| n != name);
    }

    /// Make partition enumeration fail until [`MemoryStore::restore_catalog`]
    pub fn fail_catalog(&self, message: impl Into<String>) {
        self.write().catalog_failure = Some(message.into());
    }

    /// Let partition enumeration succeed again
    pub fn restore_catalog(&self) {
        self.write().catalog_failure = None;
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_partitions(&self) -> Result<Vec<Partition>, StoreError> {
        let state = self.read();
        if let Some(message) = &state.catalog_failure {
            return Err(StoreError::Unavailable(message.clone()));
        }
        Ok(state
            .partitions
            .iter()
            .map(|(name, _)| Partition::new(name.clone()))
            .collect())
    }

    async fn find(
        &self,
        partition: &Partition,
        filter: &SearchQuery,
        projection: &Projection,
    ) -> Result<Vec<Record>, StoreError> {
        let state = self.read();
        match state.partitions.iter().find(|(n, _)| n == partition.name()) {
            Some((_, Contents::Documents(documents))) => Ok(select(documents, filter, projection)),
            Some((_, Contents::Faulty(message))) => Err(StoreError::Other(message.clone())),
            None => Err(StoreError::Unavailable(format!(
                "partition '{}' no longer exists",
                partition
            ))),
        }
    }
}
