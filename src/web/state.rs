//! Application state shared across handlers

use crate::config::Settings;
use crate::metrics::Metrics;
use crate::search::Search;
use crate::store::Store;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Search executor
    pub search: Arc<Search>,
    /// Partition metrics, shared with the executor
    pub metrics: Arc<Metrics>,
    /// Template renderer
    pub templates: Arc<super::Templates>,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Settings, store: Arc<dyn Store>) -> anyhow::Result<Self> {
        let metrics = Arc::new(Metrics::new());
        let search = Search::from_settings(store, &settings.search).with_metrics(metrics.clone());
        let templates = Arc::new(super::Templates::new()?);

        Ok(Self {
            settings: Arc::new(settings),
            search: Arc::new(search),
            metrics,
            templates,
        })
    }

    /// Get instance name
    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }

    /// Canonical column order for tables and CSV
    pub fn column_order(&self) -> &[String] {
        &self.settings.search.column_order
    }
}
