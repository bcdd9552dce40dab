//! Leak Sniffer: search a domain across every leak collection in a store
//!
//! Collections are discovered at query time and searched concurrently with a
//! bounded worker pool. Matches are unioned, normalized to a fixed column
//! schema, and presented as an HTML table, JSON, or CSV.

pub mod config;
pub mod error;
pub mod metrics;
pub mod results;
pub mod search;
pub mod store;
pub mod web;

pub use config::Settings;
pub use error::{PartitionFault, SearchError, StoreError};
pub use results::{normalize, NormalizedTable, Record, SearchOutcome};
pub use search::{Search, SearchQuery};
pub use store::{Partition, Store};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default number of partitions searched concurrently
pub const DEFAULT_MAX_WORKERS: usize = 16;
