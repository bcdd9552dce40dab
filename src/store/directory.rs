//! Directory-backed store: one JSON or JSON-lines file per partition

use super::traits::{select, Document, Partition, Projection, Store};
use crate::error::StoreError;
use crate::results::Record;
use crate::search::SearchQuery;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

const EXTENSIONS: [&str; 2] = ["json", "jsonl"];

/// Store reading partitions from `<root>/<database>/*.json{,l}`
///
/// Files are re-read on every query, so partitions added or removed on disk
/// show up on the next search. A partition is named after its file stem;
/// when two files share a stem, both are listed under their full file names.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Store whose partitions are the files directly inside `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open the database directory below a base path
    pub fn open(base: impl AsRef<Path>, database: &str) -> Self {
        Self::new(base.as_ref().join(database))
    }

    async fn partition_path(&self, partition: &Partition) -> Result<PathBuf, StoreError> {
        let name = partition.name();
        if name.is_empty() || name.contains(['/', '\\']) || name == ".." {
            return Err(StoreError::Unavailable(format!(
                "invalid partition name '{}'",
                name
            )));
        }

        let mut candidates = Vec::new();
        for ext in EXTENSIONS {
            let path = self.root.join(format!("{}.{}", name, ext));
            if is_file(&path).await {
                candidates.push(path);
            }
        }

        // Names of files that share a stem carry their extension
        if candidates.is_empty() && has_partition_extension(Path::new(name)) {
            let path = self.root.join(name);
            if is_file(&path).await {
                return Ok(path);
            }
        }

        match candidates.len() {
            0 => Err(StoreError::Unavailable(format!(
                "partition '{}' no longer exists",
                name
            ))),
            1 => Ok(candidates.remove(0)),
            _ => Err(StoreError::malformed(
                name,
                "ambiguous name, more than one file shares it",
            )),
        }
    }
}

#[async_trait]
impl Store for DirectoryStore {
    fn name(&self) -> &str {
        "directory"
    }

    async fn list_partitions(&self) -> Result<Vec<Partition>, StoreError> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| StoreError::Unavailable(format!("{}: {}", self.root.display(), e)))?;

        // file stem -> file names carrying it
        let mut files: HashMap<String, Vec<String>> = HashMap::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let path = entry.path();
            if !has_partition_extension(&path) {
                continue;
            }
            let stem = path.file_stem().and_then(|s| s.to_str());
            let file_name = path.file_name().and_then(|s| s.to_str());
            if let (Some(stem), Some(file_name)) = (stem, file_name) {
                files
                    .entry(stem.to_string())
                    .or_default()
                    .push(file_name.to_string());
            }
        }

        let mut names: Vec<String> = files
            .into_iter()
            .flat_map(|(stem, file_names)| {
                if file_names.len() == 1 {
                    vec![stem]
                } else {
                    file_names
                }
            })
            .collect();
        names.sort();
        debug!("Found {} partitions in {}", names.len(), self.root.display());

        Ok(names.into_iter().map(Partition::new).collect())
    }

    async fn find(
        &self,
        partition: &Partition,
        filter: &SearchQuery,
        projection: &Projection,
    ) -> Result<Vec<Record>, StoreError> {
        let path = self.partition_path(partition).await?;
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            ErrorKind::PermissionDenied => {
                StoreError::PermissionDenied(format!("{}: {}", path.display(), e))
            }
            ErrorKind::NotFound => {
                StoreError::Unavailable(format!("partition '{}' no longer exists", partition))
            }
            _ => StoreError::Io(e),
        })?;

        let jsonl = path.extension().and_then(|e| e.to_str()) == Some("jsonl");
        let documents = if jsonl {
            parse_json_lines(partition.name(), &content)?
        } else {
            let value: Value = serde_json::from_str(&content)
                .map_err(|e| StoreError::malformed(partition.name(), e))?;
            documents_from_value(partition.name(), value)?
        };

        Ok(select(&documents, filter, projection))
    }
}

fn has_partition_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| EXTENSIONS.contains(&e))
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

/// Interpret a JSON value as an array of documents
pub(crate) fn documents_from_value(partition: &str, value: Value) -> Result<Vec<Document>, StoreError> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(doc) => Ok(doc),
                _ => Err(StoreError::malformed(
                    partition,
                    format!("entry {} is not an object", i),
                )),
            })
            .collect(),
        _ => Err(StoreError::malformed(partition, "expected an array of objects")),
    }
}

fn parse_json_lines(partition: &str, content: &str) -> Result<Vec<Document>, StoreError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<Document>(line)
                .map_err(|e| StoreError::malformed(partition, format!("line {}: {}", i + 1, e)))
        })
        .collect()
}
