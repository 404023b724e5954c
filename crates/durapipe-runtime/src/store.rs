//! State store backends.

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;
use tracing::debug;

use durapipe_protocols::error::StoreError;
use durapipe_protocols::StateStore;

/// In-memory state store for testing.
pub struct MemoryStateStore {
    entries: tokio::sync::RwLock<HashMap<String, Value>>,
}

impl MemoryStateStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            entries: tokio::sync::RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }
}

/// On-disk record wrapping a stored value.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    saved_at: DateTime<Utc>,
    value: Value,
}

/// File system based state store for local runs.
///
/// Values are stored as individual JSON files keyed by sanitized key name:
/// ```text
/// {storage_path}/
/// └── state/
///     ├── {key}.json
///     └── ...
/// ```
pub struct FileStateStore {
    storage_path: PathBuf,
}

impl FileStateStore {
    /// Create a new file-based state store.
    ///
    /// # Arguments
    /// * `storage_path` - Base directory for storing state files
    pub async fn new(storage_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let storage_path = storage_path.into();
        fs::create_dir_all(storage_path.join("state")).await?;

        debug!("FileStateStore initialized at {:?}", storage_path);

        Ok(Self { storage_path })
    }

    fn state_dir(&self) -> PathBuf {
        self.storage_path.join("state")
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.state_dir()
            .join(format!("{}.json", Self::sanitize_key(key)))
    }

    /// Sanitize a key for use as a file name.
    fn sanitize_key(key: &str) -> String {
        key.chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect()
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn save(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        let record = StoredRecord {
            saved_at: Utc::now(),
            value: value.clone(),
        };
        let content = serde_json::to_string_pretty(&record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        // Write through a temp file so readers never observe a partial record.
        let path = self.entry_path(key);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, content).await?;
        fs::rename(&tmp_path, &path).await?;

        debug!("Saved state for key {} at {:?}", key, path);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.entry_path(key);
        match fs::read_to_string(&path).await {
            Ok(content) => {
                let record: StoredRecord = serde_json::from_str(&content)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(record.value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.entry_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
