//! Error types for search operations
//!
//! Only fatal conditions live in [`SearchError`]. A failing partition is
//! reported as a [`PartitionFault`] value and never escapes the aggregator.

use serde::Serialize;
use thiserror::Error;

/// Fatal or input errors returned by a search
#[derive(Debug, Error)]
pub enum SearchError {
    /// The caller supplied an unusable query value
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    /// The store could not enumerate its partitions
    #[error("Failed to list partitions: {0}")]
    Catalog(#[source] StoreError),

    /// The worker pool could not run the search
    #[error("Search infrastructure failure: {0}")]
    Infrastructure(String),
}

impl SearchError {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error aborts the whole search (as opposed to bad input)
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::InvalidInput { .. })
    }
}

/// Errors raised by a store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be decoded
    #[error("Malformed data in {partition}: {reason}")]
    Malformed { partition: String, reason: String },

    /// The store or partition is not reachable
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("{0}")]
    Other(String),
}

impl StoreError {
    pub fn malformed(partition: impl Into<String>, reason: impl ToString) -> Self {
        Self::Malformed {
            partition: partition.into(),
            reason: reason.to_string(),
        }
    }
}

/// A single partition's failure, absorbed by the aggregator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionFault {
    /// Partition that failed
    pub partition: String,
    /// Human readable message
    pub message: String,
}

impl PartitionFault {
    pub fn new(partition: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for PartitionFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error searching {}: {}", self.partition, self.message)
    }
}
