//! Document store module
//!
//! Defines the Store trait the search core queries, plus the bundled backends.

mod directory;
mod loader;
mod memory;
mod traits;

pub use directory::DirectoryStore;
pub use loader::StoreLoader;
pub use memory::MemoryStore;
pub use traits::*;
