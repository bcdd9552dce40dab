//! Search execution and orchestration

use super::catalog::PartitionCatalog;
use super::models::{SearchQuery, DEFAULT_FIELD};
use super::searcher::PartitionSearcher;
use crate::config::SearchSettings;
use crate::error::{PartitionFault, SearchError};
use crate::metrics::Metrics;
use crate::results::{Record, SearchOutcome, Timing};
use crate::store::{Partition, Projection, Store};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// What one partition task hands back to the orchestrator
struct PartitionReport {
    partition: Partition,
    result: Result<Vec<Record>, PartitionFault>,
    elapsed: Duration,
}

/// Search executor that fans a query out over every partition
///
/// At most `max_workers` partition searches run at once. The caller waits
/// until every partition has answered or failed.
pub struct Search {
    catalog: PartitionCatalog,
    searcher: PartitionSearcher,
    field: String,
    max_workers: usize,
    metrics: Arc<Metrics>,
}

impl Search {
    /// Create a new search executor with default settings
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            catalog: PartitionCatalog::new(store.clone()),
            searcher: PartitionSearcher::new(store, Projection::default()),
            field: DEFAULT_FIELD.to_string(),
            max_workers: crate::DEFAULT_MAX_WORKERS,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Create a search executor from search settings
    pub fn from_settings(store: Arc<dyn Store>, settings: &SearchSettings) -> Self {
        Self::new(store.clone())
            .with_field(settings.field.clone())
            .with_max_workers(settings.max_workers)
            .with_searcher(
                PartitionSearcher::new(store, Projection::new(settings.projection.clone()))
                    .with_timeout(settings.partition_timeout()),
            )
    }

    /// Set the worker pool size (at least one)
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers.max(1);
        self
    }

    /// Set the field the equality filter applies to
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    /// Replace the per-partition searcher (projection, timeout)
    pub fn with_searcher(mut self, searcher: PartitionSearcher) -> Self {
        self.searcher = searcher;
        self
    }

    /// Share a metrics collector
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Worker pool size
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Metrics collector shared with the web layer
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Validate raw user input and search for it
    ///
    /// Blank input is rejected before the store is touched.
    pub async fn search_domain(&self, raw: &str) -> Result<SearchOutcome, SearchError> {
        let query = SearchQuery::new(self.field.clone(), raw).map_err(|e| {
            warn!("Rejected search input: {}", e);
            e
        })?;
        self.aggregate(&query).await
    }

    /// Search every partition and union the matches
    pub async fn aggregate(&self, query: &SearchQuery) -> Result<SearchOutcome, SearchError> {
        let search_id = Uuid::new_v4();
        let span = info_span!("search", id = %search_id, value = %query.value());
        self.run(search_id, query).instrument(span).await
    }

    async fn run(&self, search_id: Uuid, query: &SearchQuery) -> Result<SearchOutcome, SearchError> {
        let start = Instant::now();
        self.metrics.inc_search();

        let partitions = self.catalog.list_partitions().await?;
        self.metrics.retain_partitions(partitions.iter().map(Partition::name));
        let mut outcome = SearchOutcome::new(search_id, query.value());
        outcome.partitions_searched = partitions.len();

        info!(
            "Executing search on {} partitions with {} workers",
            partitions.len(),
            self.max_workers
        );

        let permits = Arc::new(Semaphore::new(self.max_workers));
        let query = Arc::new(query.clone());
        let mut tasks = JoinSet::new();

        for partition in partitions {
            let permits = permits.clone();
            let searcher = self.searcher.clone();
            let query = query.clone();

            tasks.spawn(
                async move {
                    let _permit = permits.acquire_owned().await.map_err(|_| {
                        SearchError::Infrastructure(format!(
                            "worker pool closed before searching {}",
                            partition
                        ))
                    })?;

                    let started = Instant::now();
                    let result = AssertUnwindSafe(searcher.search(&partition, &query))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|panic| {
                            let message = panic_message(panic.as_ref());
                            warn!("Partition search for {} panicked: {}", partition, message);
                            Err(PartitionFault::new(partition.name(), message))
                        });

                    Ok::<_, SearchError>(PartitionReport {
                        partition,
                        result,
                        elapsed: started.elapsed(),
                    })
                }
                .in_current_span(),
            );
        }

        // Only this task appends to the outcome; workers hand results back.
        while let Some(joined) = tasks.join_next().await {
            let report = joined
                .map_err(|e| {
                    error!("Partition task failed: {}", e);
                    SearchError::Infrastructure(format!("partition task failed: {}", e))
                })?
                .map_err(|e| {
                    error!("{}", e);
                    e
                })?;
            self.absorb(&mut outcome, report);
        }

        let elapsed = start.elapsed();
        outcome.elapsed_ms = elapsed.as_millis() as u64;

        info!(
            "Search found {} records ({} partition faults) in {:?}",
            outcome.result_count(),
            outcome.faults().len(),
            elapsed
        );

        Ok(outcome)
    }

    fn absorb(&self, outcome: &mut SearchOutcome, report: PartitionReport) {
        let name = report.partition.name().to_string();
        let time_ms = report.elapsed.as_millis() as u64;

        match report.result {
            Ok(records) => {
                debug!(
                    "Partition {} returned {} records in {:?}",
                    name,
                    records.len(),
                    report.elapsed
                );
                self.metrics.record_partition(&name, time_ms, false);
                outcome.add_timing(Timing {
                    partition: name,
                    time_ms,
                    result_count: records.len(),
                });
                outcome.extend_records(records);
            }
            Err(fault) => {
                self.metrics.record_partition(&name, time_ms, true);
                outcome.add_timing(Timing {
                    partition: name,
                    time_ms,
                    result_count: 0,
                });
                outcome.add_fault(fault);
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "partition search panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn leak(domain: &str, url: &str, user: &str, password: &str) -> serde_json::Value {
        json!({"_id": user, "Domain": domain, "URL": url, "Username": user, "Password": password})
    }

    fn usernames(outcome: &SearchOutcome) -> Vec<String> {
        let mut names: Vec<String> = outcome.records().iter().map(|r| r.text("Username")).collect();
        names.sort();
        names
    }

    /// Store that records how many lookups overlap
    #[derive(Default)]
    struct InstrumentedStore {
        partitions: usize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        catalog_calls: AtomicUsize,
        find_calls: AtomicUsize,
    }

    impl InstrumentedStore {
        fn with_partitions(partitions: usize) -> Self {
            Self {
                partitions,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl Store for InstrumentedStore {
        fn name(&self) -> &str {
            "instrumented"
        }

        async fn list_partitions(&self) -> Result<Vec<Partition>, StoreError> {
            self.catalog_calls.fetch_add(1, Ordering::SeqCst);
            Ok((0..self.partitions)
                .map(|i| Partition::new(format!("p{}", i)))
                .collect())
        }

        async fn find(
            &self,
            partition: &Partition,
            filter: &SearchQuery,
            _projection: &Projection,
        ) -> Result<Vec<Record>, StoreError> {
            self.find_calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(Duration::from_millis(20)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![Record::from_pairs([
                ("Domain", filter.value()),
                ("Username", partition.name()),
            ])])
        }
    }

    /// Store whose lookup panics for one partition
    struct PanickingStore;

    #[async_trait]
    impl Store for PanickingStore {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn list_partitions(&self) -> Result<Vec<Partition>, StoreError> {
            Ok(vec![Partition::new("ok"), Partition::new("boom")])
        }

        async fn find(
            &self,
            partition: &Partition,
            filter: &SearchQuery,
            _projection: &Projection,
        ) -> Result<Vec<Record>, StoreError> {
            if partition.name() == "boom" {
                panic!("cursor exploded");
            }
            Ok(vec![Record::from_pairs([("Domain", filter.value())])])
        }
    }

    #[tokio::test]
    async fn test_search_executor_empty_store() {
        let search = Search::new(Arc::new(MemoryStore::new()));
        let query = SearchQuery::domain("example.com").unwrap();
        let outcome = search.aggregate(&query).await.unwrap();

        assert!(outcome.is_empty()); // No partitions
        assert_eq!(outcome.partitions_searched, 0);
    }

    #[tokio::test]
    async fn test_mixed_partitions() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_json("a", json!([leak("example.com", "u1", "a", "p1")]))
            .unwrap();
        store
            .insert_json("b", json!([leak("other.org", "u2", "b", "p2")]))
            .unwrap();
        store.insert_faulty("c", "operation exceeded time limit");

        let search = Search::new(store);
        let outcome = search.search_domain("example.com").await.unwrap();

        assert_eq!(outcome.result_count(), 1);
        let record = &outcome.records()[0];
        assert_eq!(
            record,
            &Record::from_pairs([
                ("Domain", "example.com"),
                ("URL", "u1"),
                ("Username", "a"),
                ("Password", "p1"),
            ])
        );
        assert_eq!(outcome.faults(), &[PartitionFault::new("c", "operation exceeded time limit")]);
        assert_eq!(outcome.partitions_searched, 3);
        assert_eq!(outcome.timings().len(), 3);
    }

    #[tokio::test]
    async fn test_union_keeps_duplicates_across_partitions() {
        let store = Arc::new(MemoryStore::new());
        let same = leak("example.com", "u", "dup", "p");
        store.insert_json("a", json!([same.clone(), leak("example.com", "u", "x", "p")])).unwrap();
        store.insert_json("b", json!([same])).unwrap();
        store.insert_json("c", json!([])).unwrap();

        let outcome = Search::new(store).search_domain("example.com").await.unwrap();
        assert_eq!(usernames(&outcome), vec!["dup", "dup", "x"]);
    }

    #[tokio::test]
    async fn test_fault_isolation() {
        let store = Arc::new(MemoryStore::new());
        for i in 0..4 {
            let user = format!("user{}", i);
            store
                .insert_json(format!("ok{}", i), json!([leak("example.com", "u", &user, "p")]))
                .unwrap();
        }
        store.insert_faulty("broken", "not authorized");

        let outcome = Search::new(store)
            .with_max_workers(2)
            .search_domain("example.com")
            .await
            .unwrap();

        assert_eq!(usernames(&outcome), vec!["user0", "user1", "user2", "user3"]);
        assert_eq!(outcome.faults().len(), 1);
    }

    #[tokio::test]
    async fn test_all_empty_is_not_an_error() {
        let store = Arc::new(MemoryStore::new());
        store.insert_json("a", json!([leak("other.org", "u", "a", "p")])).unwrap();
        store.insert_json("b", json!([])).unwrap();

        let outcome = Search::new(store).search_domain("example.com").await.unwrap();
        assert!(outcome.is_empty());
        assert!(outcome.faults().is_empty());
    }

    #[tokio::test]
    async fn test_catalog_failure_aborts() {
        let store = Arc::new(MemoryStore::new());
        store.fail_catalog("server selection timeout");

        let err = Search::new(store).search_domain("example.com").await.unwrap_err();
        assert!(matches!(err, SearchError::Catalog(_)));
    }

    #[tokio::test]
    async fn test_blank_input_dispatches_nothing() {
        let store = Arc::new(InstrumentedStore::with_partitions(3));
        let search = Search::new(store.clone());

        let err = search.search_domain("   ").await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidInput { .. }));
        assert_eq!(store.catalog_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.find_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_bound() {
        let store = Arc::new(InstrumentedStore::with_partitions(5));
        let search = Search::new(store.clone()).with_max_workers(2);

        let outcome = search.search_domain("example.com").await.unwrap();

        assert_eq!(outcome.result_count(), 5);
        assert_eq!(store.find_calls.load(Ordering::SeqCst), 5);
        assert_eq!(store.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_default_pool_runs_partitions_together() {
        let store = Arc::new(InstrumentedStore::with_partitions(5));
        let search = Search::new(store.clone());
        assert_eq!(search.max_workers(), 16);

        search.search_domain("example.com").await.unwrap();
        assert_eq!(store.peak.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_zero_workers_clamped() {
        let store = Arc::new(InstrumentedStore::with_partitions(2));
        let search = Search::new(store).with_max_workers(0);
        assert_eq!(search.max_workers(), 1);

        let outcome = search.search_domain("example.com").await.unwrap();
        assert_eq!(outcome.result_count(), 2);
    }

    #[tokio::test]
    async fn test_panic_is_isolated() {
        let outcome = Search::new(Arc::new(PanickingStore))
            .search_domain("example.com")
            .await
            .unwrap();

        assert_eq!(outcome.result_count(), 1);
        assert_eq!(outcome.faults().len(), 1);
        assert_eq!(outcome.faults()[0].partition, "boom");
        assert_eq!(outcome.faults()[0].message, "cursor exploded");
    }

    #[tokio::test]
    async fn test_metrics_recorded() {
        let store = Arc::new(MemoryStore::new());
        store.insert_json("a", json!([])).unwrap();
        store.insert_faulty("b", "down");

        let search = Search::new(store);
        search.search_domain("example.com").await.unwrap();

        let metrics = search.metrics();
        assert_eq!(metrics.get_total_searches(), 1);
        assert_eq!(metrics.get_partition_stats("a").unwrap().faults, 0);
        assert_eq!(metrics.get_partition_stats("b").unwrap().faults, 1);
    }

    #[tokio::test]
    async fn test_metrics_follow_catalog() {
        let store = Arc::new(MemoryStore::new());
        store.insert_json("a", json!([])).unwrap();
        store.insert_json("b", json!([])).unwrap();

        let search = Search::new(store.clone());
        search.search_domain("example.com").await.unwrap();
        store.remove("b");
        search.search_domain("example.com").await.unwrap();

        let metrics = search.metrics();
        assert_eq!(metrics.get_partition_stats("a").unwrap().searches, 2);
        assert!(metrics.get_partition_stats("b").is_none());
    }

    #[tokio::test]
    async fn test_from_settings_uses_projection_and_field() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_json("a", json!([{"Host": "example.com", "Username": "a", "Password": "p"}]))
            .unwrap();

        let settings = SearchSettings {
            field: "Host".to_string(),
            projection: vec!["Host".to_string(), "Username".to_string()],
            ..Default::default()
        };
        let outcome = Search::from_settings(store, &settings)
            .search_domain("example.com")
            .await
            .unwrap();

        let fields: Vec<&str> = outcome.records()[0].fields().collect();
        assert_eq!(fields, vec!["Host", "Username"]);
    }

    #[tokio::test]
    async fn test_from_settings_ignores_unrepresentable_timeout() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_json("a", json!([{"Domain": "example.com", "Username": "a"}]))
            .unwrap();

        let settings = SearchSettings {
            partition_timeout_secs: Some(f64::INFINITY),
            ..Default::default()
        };
        let outcome = Search::from_settings(store, &settings)
            .search_domain("example.com")
            .await
            .unwrap();
        assert_eq!(outcome.result_count(), 1);
    }
}
