use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use resource_map_shared::categories::CATEGORIES;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{} does not contain a JSON array", .path.display())]
    NotArray { path: PathBuf },
    #[error("Unknown collection: {0}")]
    Unknown(String),
}

/// Read-only named collections, loaded once at startup.
///
/// Every `<name>.json` file in the data directory becomes the collection
/// `<name>`; the file must hold a JSON array of records.
#[derive(Debug, Default)]
pub struct CollectionStore {
    collections: BTreeMap<String, Arc<Vec<Value>>>,
}

impl CollectionStore {
    pub fn load(dir: &Path) -> Result<Self, CollectionError> {
        let entries = std::fs::read_dir(dir).map_err(|source| CollectionError::Read {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut collections = BTreeMap::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            // A broken file only takes out its own collection
            match Self::load_file(&path) {
                Ok(records) => {
                    tracing::info!(collection = %name, records = records.len(), "Loaded collection");
                    collections.insert(name, Arc::new(records));
                }
                Err(e) => tracing::warn!(collection = %name, error = %e, "Skipping collection"),
            }
        }

        for config in &CATEGORIES {
            if !collections.contains_key(config.collection) {
                tracing::warn!(
                    collection = config.collection,
                    category = %config.category,
                    "No data file for map category"
                );
            }
        }

        Ok(CollectionStore { collections })
    }

    fn load_file(path: &Path) -> Result<Vec<Value>, CollectionError> {
        let data = std::fs::read_to_string(path).map_err(|source| CollectionError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_str(&data).map_err(|source| CollectionError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        match value {
            Value::Array(records) => Ok(records),
            _ => Err(CollectionError::NotArray {
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn from_collections<I>(collections: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<Value>)>,
    {
        CollectionStore {
            collections: collections
                .into_iter()
                .map(|(name, records)| (name, Arc::new(records)))
                .collect(),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.collections.keys().cloned().collect()
    }

    pub fn select_all(&self, name: &str) -> Result<Arc<Vec<Value>>, CollectionError> {
        self.collections
            .get(name)
            .cloned()
            .ok_or_else(|| CollectionError::Unknown(name.to_string()))
    }
}
