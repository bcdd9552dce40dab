//! Single-partition lookup with local fault handling

use super::models::SearchQuery;
use crate::error::{PartitionFault, StoreError};
use crate::results::Record;
use crate::store::{Partition, Projection, Store};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Runs the equality lookup against one partition
///
/// Store errors are turned into a [`PartitionFault`]; they never abort the
/// surrounding aggregation.
#[derive(Clone)]
pub struct PartitionSearcher {
    store: Arc<dyn Store>,
    projection: Arc<Projection>,
    timeout: Option<Duration>,
}

impl PartitionSearcher {
    /// Searcher applying `projection` to every lookup, without a time limit
    pub fn new(store: Arc<dyn Store>, projection: Projection) -> Self {
        Self {
            store,
            projection: Arc::new(projection),
            timeout: None,
        }
    }

    /// Bound each lookup; `None` waits for the store indefinitely
    pub fn with_timeout(mut self, limit: Option<Duration>) -> Self {
        self.timeout = limit;
        self
    }

    /// Search one partition
    pub async fn search(
        &self,
        partition: &Partition,
        query: &SearchQuery,
    ) -> Result<Vec<Record>, PartitionFault> {
        debug!("Searching partition {}", partition);

        let lookup = self.store.find(partition, query, &self.projection);
        let result = match self.timeout {
            Some(limit) => timeout(limit, lookup)
                .await
                .unwrap_or(Err(StoreError::Timeout(limit))),
            None => lookup.await,
        };

        result.map_err(|e| {
            warn!("Error searching partition {}: {}", partition, e);
            PartitionFault::new(partition.name(), e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;

    struct SlowStore;

    #[async_trait]
    impl Store for SlowStore {
        fn name(&self) -> &str {
            "slow"
        }

        async fn list_partitions(&self) -> Result<Vec<Partition>, StoreError> {
            Ok(vec![Partition::new("slow")])
        }

        async fn find(
            &self,
            _partition: &Partition,
            _filter: &SearchQuery,
            _projection: &Projection,
        ) -> Result<Vec<Record>, StoreError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_matches_are_returned() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_json("leaks", json!([{"Domain": "example.com", "Username": "a"}]))
            .unwrap();

        let searcher = PartitionSearcher::new(store, Projection::default());
        let query = SearchQuery::domain("example.com").unwrap();
        let records = searcher.search(&Partition::new("leaks"), &query).await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_store_error_becomes_fault() {
        let store = Arc::new(MemoryStore::new());
        store.insert_faulty("locked", "permission denied");

        let searcher = PartitionSearcher::new(store, Projection::default());
        let query = SearchQuery::domain("example.com").unwrap();
        let fault = searcher
            .search(&Partition::new("locked"), &query)
            .await
            .unwrap_err();
        assert_eq!(fault, PartitionFault::new("locked", "permission denied"));
    }

    #[tokio::test]
    async fn test_timeout_becomes_fault() {
        let searcher = PartitionSearcher::new(Arc::new(SlowStore), Projection::default())
            .with_timeout(Some(Duration::from_millis(50)));
        let query = SearchQuery::domain("example.com").unwrap();

        let fault = searcher
            .search(&Partition::new("slow"), &query)
            .await
            .unwrap_err();
        assert!(fault.message.starts_with("Timed out"));
    }
}
