//! Search orchestration module
//!
//! Discovers partitions, fans the query out over a bounded worker pool,
//! and unions the matches.

mod catalog;
mod executor;
mod models;
mod searcher;

pub use catalog::PartitionCatalog;
pub use executor::Search;
pub use models::*;
pub use searcher::PartitionSearcher;
