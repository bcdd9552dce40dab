//! Store loader for opening the configured backend

use super::directory::DirectoryStore;
use super::memory::MemoryStore;
use super::traits::Store;
use crate::config::StoreSettings;
use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::info;

/// Loader for opening a store from configuration
pub struct StoreLoader;

impl StoreLoader {
    /// Open the store named by `settings.uri`
    pub fn open(settings: &StoreSettings) -> Result<Arc<dyn Store>> {
        let uri = settings.uri.trim();
        if uri.is_empty() {
            bail!("store.uri must not be empty");
        }

        let store: Arc<dyn Store> = match uri.split_once("://") {
            Some(("file", path)) => Arc::new(DirectoryStore::open(path, &settings.database)),
            Some(("memory", _)) => Arc::new(MemoryStore::new()),
            Some((scheme, _)) => {
                bail!(
                    "Unsupported store scheme '{}' (available: {})",
                    scheme,
                    Self::available_schemes().join(", ")
                );
            }
            None => Arc::new(DirectoryStore::open(uri, &settings.database)),
        };

        info!(
            "Opened {} store for database '{}'",
            store.name(),
            settings.database
        );
        Ok(store)
    }

    /// Get list of supported URI schemes
    pub fn available_schemes() -> Vec<&'static str> {
        vec!["file", "memory"]
    }
}
