//! Settings structures for Leak Sniffer configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Fields retrieved from every partition, internal identifiers excluded
pub const DEFAULT_PROJECTION: [&str; 4] = ["Domain", "URL", "Username", "Password"];

/// Main settings structure matching settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub store: StoreSettings,
    pub search: SearchSettings,
    pub server: ServerSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables (LEAKSNIFFER_* prefix)
    ///
    /// `MONGO_URI`, `DATABASE_NAME` and `MAX_WORKERS` are read when the
    /// prefixed variable is absent.
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    fn merge_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("LEAKSNIFFER_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Some(val) = var("LEAKSNIFFER_STORE_URI").or_else(|| var("MONGO_URI")) {
            self.store.uri = val;
        }
        if let Some(val) = var("LEAKSNIFFER_DATABASE").or_else(|| var("DATABASE_NAME")) {
            self.store.database = val;
        }
        if let Some(val) = var("LEAKSNIFFER_MAX_WORKERS").or_else(|| var("MAX_WORKERS")) {
            if let Ok(workers) = val.parse() {
                self.search.max_workers = workers;
            }
        }
        if let Some(val) = var("LEAKSNIFFER_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("LEAKSNIFFER_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
    }

    /// Reject settings the search core cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.search.max_workers == 0 {
            bail!("search.max_workers must be at least 1");
        }
        if self.search.field.trim().is_empty() {
            bail!("search.field must not be empty");
        }
        if self.search.projection.is_empty() {
            bail!("search.projection must list at least one field");
        }
        if self.search.column_order.is_empty() {
            bail!("search.column_order must list at least one field");
        }
        if self.search.export_suffix.trim().is_empty() {
            bail!("search.export_suffix must not be empty");
        }
        if let Some(secs) = self.search.partition_timeout_secs {
            if secs.is_nan() || (secs > 0.0 && Duration::try_from_secs_f64(secs).is_err()) {
                bail!(
                    "search.partition_timeout_secs must be a finite number of seconds, got {}",
                    secs
                );
            }
        }
        Ok(())
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Application name displayed in the UI
    pub instance_name: String,
    /// Browser page title
    pub page_title: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "Leak Sniffer".to_string(),
            page_title: "Leak Search".to_string(),
        }
    }
}

/// Backing store location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Store URI (`file://<dir>`, a bare directory path, or `memory://`)
    pub uri: String,
    /// Database (namespace) inside the store
    pub database: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            uri: "file://./data".to_string(),
            database: "Test".to_string(),
        }
    }
}

/// Search behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Field the equality filter applies to
    pub field: String,
    /// Maximum number of partitions searched concurrently
    pub max_workers: usize,
    /// Fields retrieved from the store
    pub projection: Vec<String>,
    /// Canonical column order for display and export
    pub column_order: Vec<String>,
    /// Optional upper bound for a single partition search, in seconds
    pub partition_timeout_secs: Option<f64>,
    /// Suffix appended to the domain to form the CSV file name
    pub export_suffix: String,
}

impl SearchSettings {
    /// Per-partition time limit; zero, negative or out-of-range values disable it
    pub fn partition_timeout(&self) -> Option<Duration> {
        self.partition_timeout_secs
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            field: "Domain".to_string(),
            max_workers: crate::DEFAULT_MAX_WORKERS,
            projection: DEFAULT_PROJECTION.iter().map(|f| f.to_string()).collect(),
            column_order: DEFAULT_PROJECTION.iter().map(|f| f.to_string()).collect(),
            partition_timeout_secs: None,
            export_suffix: "_leaks.csv".to_string(),
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8501,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}
