//! Aggregated outcome of one search run

use super::normalize::{normalize, NormalizedTable};
use super::types::{Record, Timing};
use crate::error::PartitionFault;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Records unioned across partitions, in partition completion order
///
/// No deduplication is performed: identical records from different
/// partitions all appear.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    /// Identifier used in logs for this run
    pub search_id: Uuid,
    /// Trimmed value searched for
    pub query: String,
    /// Start of the run
    pub searched_at: DateTime<Utc>,
    /// Number of partitions in the catalog snapshot
    pub partitions_searched: usize,
    /// Wall time of the whole run
    pub elapsed_ms: u64,
    records: Vec<Record>,
    faults: Vec<PartitionFault>,
    timings: Vec<Timing>,
}

impl SearchOutcome {
    pub fn new(search_id: Uuid, query: impl Into<String>) -> Self {
        Self {
            search_id,
            query: query.into(),
            searched_at: Utc::now(),
            partitions_searched: 0,
            elapsed_ms: 0,
            records: Vec::new(),
            faults: Vec::new(),
            timings: Vec::new(),
        }
    }

    /// Append one partition's records
    pub fn extend_records(&mut self, records: Vec<Record>) {
        self.records.extend(records);
    }

    /// Record an absorbed partition failure
    pub fn add_fault(&mut self, fault: PartitionFault) {
        self.faults.push(fault);
    }

    pub fn add_timing(&mut self, timing: Timing) {
        self.timings.push(timing);
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn faults(&self) -> &[PartitionFault] {
        &self.faults
    }

    pub fn timings(&self) -> &[Timing] {
        &self.timings
    }

    pub fn result_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Shape the records into the canonical table
    pub fn normalize<S: AsRef<str>>(&self, canonical: &[S]) -> NormalizedTable {
        normalize(&self.records, canonical)
    }
}
