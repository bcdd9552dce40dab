//! Result types, normalization and export
//!
//! Records come back from partitions with whatever fields those partitions
//! hold; this module unions them and shapes them for display and CSV.

mod export;
mod normalize;
mod outcome;
mod types;

pub use export::{csv_filename, to_csv};
pub use normalize::{normalize, NormalizedTable};
pub use outcome::SearchOutcome;
pub use types::*;
