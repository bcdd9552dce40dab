//! Partition enumeration

use crate::error::SearchError;
use crate::store::{Partition, Store};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::error;

/// Lists the partitions available at query time
///
/// Nothing is cached: every call asks the store again.
#[derive(Clone)]
pub struct PartitionCatalog {
    store: Arc<dyn Store>,
}

impl PartitionCatalog {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Enumerate partitions in store order, names unique
    pub async fn list_partitions(&self) -> Result<Vec<Partition>, SearchError> {
        let partitions = self.store.list_partitions().await.map_err(|e| {
            error!("Failed to list partitions from {} store: {}", self.store.name(), e);
            SearchError::Catalog(e)
        })?;

        let mut seen = HashSet::new();
        Ok(partitions
            .into_iter()
            .filter(|p| seen.insert(p.name().to_string()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::results::Record;
    use crate::search::SearchQuery;
    use crate::store::{MemoryStore, Projection};
    use async_trait::async_trait;

    struct DuplicatingStore;

    #[async_trait]
    impl Store for DuplicatingStore {
        fn name(&self) -> &str {
            "duplicating"
        }

        async fn list_partitions(&self) -> Result<Vec<Partition>, StoreError> {
            Ok(["b", "a", "b"].into_iter().map(Partition::new).collect())
        }

        async fn find(
            &self,
            _partition: &Partition,
            _filter: &SearchQuery,
            _projection: &Projection,
        ) -> Result<Vec<Record>, StoreError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_duplicates_collapse_to_first() {
        let catalog = PartitionCatalog::new(Arc::new(DuplicatingStore));
        let names: Vec<String> = catalog
            .list_partitions()
            .await
            .unwrap()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_catalog_failure_is_fatal() {
        let store = Arc::new(MemoryStore::new());
        store.fail_catalog("connection refused");

        let err = PartitionCatalog::new(store).list_partitions().await.unwrap_err();
        assert!(matches!(err, SearchError::Catalog(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_catalog_sees_changes_between_calls() {
        let store = Arc::new(MemoryStore::new());
        let catalog = PartitionCatalog::new(store.clone());
        store.insert("a", vec![]);
        assert_eq!(catalog.list_partitions().await.unwrap().len(), 1);

        store.insert("b", vec![]);
        store.remove("a");
        let partitions = catalog.list_partitions().await.unwrap();
        assert_eq!(partitions, vec![Partition::new("b")]);
    }
}
