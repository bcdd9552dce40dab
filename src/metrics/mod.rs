//! Metrics collection module
//!
//! Tracks partition response times, fault rates, and search counts.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// Number of response times kept per partition
const RESPONSE_WINDOW: usize = 100;

/// Process-wide metrics collector
pub struct Metrics {
    /// Total search count
    total_searches: AtomicU64,
    /// Per-partition counters
    partitions: RwLock<HashMap<String, PartitionCounters>>,
}

#[derive(Debug, Default)]
struct PartitionCounters {
    searches: u64,
    faults: u64,
    response_times: Vec<u64>,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            total_searches: AtomicU64::new(0),
            partitions: RwLock::new(HashMap::new()),
        }
    }

    /// Increment total search count
    pub fn inc_search(&self) {
        self.total_searches.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one finished partition search
    pub fn record_partition(&self, partition: &str, time_ms: u64, faulted: bool) {
        let mut partitions = self.partitions.write().unwrap_or_else(PoisonError::into_inner);
        let counters = partitions.entry(partition.to_string()).or_default();

        counters.searches += 1;
        if faulted {
            counters.faults += 1;
        }
        if counters.response_times.len() >= RESPONSE_WINDOW {
            counters.response_times.remove(0);
        }
        counters.response_times.push(time_ms);
    }

    /// Drop counters for partitions missing from the latest catalog snapshot
    pub fn retain_partitions<'a>(&self, live: impl IntoIterator<Item = &'a str>) {
        let live: HashSet<&str> = live.into_iter().collect();
        let mut partitions = self.partitions.write().unwrap_or_else(PoisonError::into_inner);
        partitions.retain(|name, _| live.contains(name.as_str()));
    }

    /// Get total searches
    pub fn get_total_searches(&self) -> u64 {
        self.total_searches.load(Ordering::Relaxed)
    }

    /// Get statistics for one partition
    pub fn get_partition_stats(&self, partition: &str) -> Option<PartitionStats> {
        let partitions = self.partitions.read().unwrap_or_else(PoisonError::into_inner);
        partitions
            .get(partition)
            .map(|c| PartitionStats::from_counters(partition, c))
    }

    /// Get statistics for every partition seen, sorted by name
    pub fn get_all_stats(&self) -> Vec<PartitionStats> {
        let partitions = self.partitions.read().unwrap_or_else(PoisonError::into_inner);
        let mut stats: Vec<PartitionStats> = partitions
            .iter()
            .map(|(name, c)| PartitionStats::from_counters(name, c))
            .collect();
        stats.sort_by(|a, b| a.partition.cmp(&b.partition));
        stats
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics for a single partition
#[derive(Debug, Clone, Serialize)]
pub struct PartitionStats {
    pub partition: String,
    pub searches: u64,
    pub faults: u64,
    pub avg_response_time: Option<u64>,
    pub reliability: f64,
}

impl PartitionStats {
    fn from_counters(partition: &str, counters: &PartitionCounters) -> Self {
        let avg_response_time = if counters.response_times.is_empty() {
            None
        } else {
            Some(
                counters.response_times.iter().sum::<u64>()
                    / counters.response_times.len() as u64,
            )
        };
        let reliability = if counters.searches == 0 {
            100.0
        } else {
            (counters.searches - counters.faults) as f64 / counters.searches as f64 * 100.0
        };

        Self {
            partition: partition.to_string(),
            searches: counters.searches,
            faults: counters.faults,
            avg_response_time,
            reliability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let metrics = Metrics::new();

        metrics.inc_search();
        metrics.record_partition("combo", 100, false);
        metrics.record_partition("combo", 300, true);

        assert_eq!(metrics.get_total_searches(), 1);
        let stats = metrics.get_partition_stats("combo").unwrap();
        assert_eq!(stats.searches, 2);
        assert_eq!(stats.faults, 1);
        assert_eq!(stats.avg_response_time, Some(200));
        assert_eq!(stats.reliability, 50.0);
        assert!(metrics.get_partition_stats("unknown").is_none());
    }

    #[test]
    fn test_response_window() {
        let metrics = Metrics::new();
        for _ in 0..RESPONSE_WINDOW {
            metrics.record_partition("p", 10, false);
        }
        metrics.record_partition("p", 1010, false);

        let stats = metrics.get_partition_stats("p").unwrap();
        assert_eq!(stats.avg_response_time, Some(20));
        assert_eq!(stats.searches, 101);
    }

    #[test]
    fn test_removed_partitions_are_pruned() {
        let metrics = Metrics::new();
        metrics.record_partition("old_dump", 5, false);
        metrics.record_partition("combo", 5, false);

        metrics.retain_partitions(["combo", "fresh"]);

        let names: Vec<String> = metrics.get_all_stats().into_iter().map(|s| s.partition).collect();
        assert_eq!(names, vec!["combo"]);
    }

    #[test]
    fn test_all_stats_sorted() {
        let metrics = Metrics::new();
        metrics.record_partition("b", 1, false);
        metrics.record_partition("a", 1, false);

        let names: Vec<String> = metrics.get_all_stats().into_iter().map(|s| s.partition).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
